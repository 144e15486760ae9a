use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use marksync_core::adapters::gist::GITHUB_API_URL;
use marksync_core::{CoordinatorOptions, Platform};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Sync scheduling and remote endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Delay before a scheduled round, in seconds
    pub debounce_secs: u64,
    /// Interval between periodic rounds, in seconds
    pub period_secs: u64,
    /// Run a round after every `tree` edit (default: false)
    pub auto_sync: bool,
    /// GitHub API base URL
    pub api_url: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_secs: 60,
            period_secs: 600,
            auto_sync: false,
            api_url: GITHUB_API_URL.to_string(),
        }
    }
}

impl SyncConfig {
    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            debounce: Duration::from_secs(self.debounce_secs),
            period: Duration::from_secs(self.period_secs.max(1)),
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the bookmark tree and sync settings
    pub data_dir: ConfigValue<PathBuf>,
    /// Bookmark storage conventions of the local tree
    pub platform: ConfigValue<Platform>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub sync: SyncConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    platform: Option<Platform>,
    sync: Option<SyncConfig>,
}

/// Written by `config init`.
const DEFAULT_CONFIG: &str = "\
# marksync configuration

# Where bookmarks.json and settings.json live
# data_dir: /path/to/marksync

# firefox or chromium
platform: firefox

sync:
  debounce_secs: 60
  period_secs: 600
  auto_sync: false
  api_url: https://api.github.com
";

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut platform = ConfigValue::new(Platform::default(), ConfigSource::Default);
        let mut config_file = None;
        let mut sync = SyncConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(p) = file_config.platform {
                platform = ConfigValue::new(p, ConfigSource::File);
            }
            if let Some(sync_config) = file_config.sync {
                sync = sync_config;
            }
        }

        if let Ok(dir) = std::env::var("MARKSYNC_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(name) = std::env::var("MARKSYNC_PLATFORM") {
            let p = name.parse().map_err(ConfigError::InvalidValue)?;
            platform = ConfigValue::new(p, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("MARKSYNC_API_URL") {
            sync.api_url = url;
        }

        Ok(Self {
            data_dir,
            platform,
            config_file,
            sync,
        })
    }

    /// Local bookmark tree file
    pub fn tree_path(&self) -> PathBuf {
        self.data_dir.value.join("bookmarks.json")
    }

    /// Token, gist id and last update
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.value.join("settings.json")
    }

    /// Writes a commented default config file to `path`.
    ///
    /// Refuses to overwrite an existing file.
    pub fn init_file(path: &std::path::Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(path.to_path_buf(), e))?;
        }
        std::fs::write(path, DEFAULT_CONFIG)
            .map_err(|e| ConfigError::WriteError(path.to_path_buf(), e))
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/marksync/
    /// - macOS: ~/Library/Application Support/marksync/
    /// - Windows: %APPDATA%/marksync/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("marksync")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/marksync/
    /// - macOS: ~/Library/Application Support/marksync/
    /// - Windows: %APPDATA%/marksync/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("marksync")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    WriteError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    AlreadyExists(PathBuf),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::WriteError(path, e) => {
                write!(f, "Failed to write config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::AlreadyExists(path) => {
                write!(f, "Config file '{}' already exists", path.display())
            }
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
