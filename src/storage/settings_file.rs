use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

use marksync_core::{Settings, SettingsError, SettingsStore};

/// Sync settings kept as JSON on disk.
///
/// A missing file reads as empty settings.
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path)
            .await
            .and_then(|m| m.modified())
            .ok()
    }
}

#[async_trait]
impl SettingsStore for FileSettings {
    async fn load(&self) -> Result<Settings, SettingsError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => {
                return Err(SettingsError::Read(format!("{}: {}", self.path.display(), e)))
            }
        };
        serde_json::from_str(&contents)
            .map_err(|e| SettingsError::Parse(format!("{}: {}", self.path.display(), e)))
    }

    async fn store(&self, settings: &Settings) -> Result<(), SettingsError> {
        let write_error = |e: std::io::Error| {
            SettingsError::Write(format!("{}: {}", self.path.display(), e))
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| SettingsError::Write(e.to_string()))?;
        fs::write(&self.path, json).await.map_err(write_error)
    }
}

/// Notices settings written by another process.
///
/// Tracks the file's mtime and the sync target last seen, so only a new
/// token or remote id counts as a change. Our own `lastUpdate` stamps don't.
pub struct SettingsWatch {
    modified: Option<SystemTime>,
    seen: Settings,
}

impl SettingsWatch {
    pub async fn new(store: &FileSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            modified: store.modified().await,
            seen: store.load().await?,
        })
    }

    /// Re-reads the file if it changed. Returns true if the sync target
    /// (token or remote id) differs from the one seen before.
    pub async fn poll(&mut self, store: &FileSettings) -> Result<bool, SettingsError> {
        let current = store.modified().await;
        if current == self.modified {
            return Ok(false);
        }
        let settings = store.load().await?;
        self.modified = current;
        let changed = self.seen.target_differs(&settings);
        self.seen = settings;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn configured(gist: &str, last_update: Option<i64>) -> Settings {
        Settings {
            token: Some("tok".into()),
            remote_id: Some(gist.into()),
            last_update,
        }
    }

    async fn write_later(store: &FileSettings, settings: &Settings, secs: u64) {
        store.store(settings).await.unwrap();
        std::fs::File::options()
            .write(true)
            .open(store.path())
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(secs))
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSettings::new(temp_dir.path().join("settings.json"));

        let settings = store.load().await.unwrap();
        assert_eq!(settings, Settings::default());
        assert!(store.modified().await.is_none());
    }

    #[tokio::test]
    async fn test_store_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");
        let store = FileSettings::new(path.clone());
        let settings = Settings {
            token: Some("tok".into()),
            remote_id: Some("abc123".into()),
            last_update: Some(1_700_000_000_000),
        };

        store.store(&settings).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"remoteId\": \"abc123\""));
        assert!(raw.contains("\"lastUpdate\": 1700000000000"));
        assert_eq!(FileSettings::new(path).load().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = FileSettings::new(path).load().await.unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[tokio::test]
    async fn test_watch_reports_new_target_from_other_writer() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        let ours = FileSettings::new(path.clone());
        ours.store(&configured("gist-a", Some(1))).await.unwrap();
        let mut watch = SettingsWatch::new(&ours).await.unwrap();

        assert!(!watch.poll(&ours).await.unwrap());

        let other = FileSettings::new(path);
        write_later(&other, &configured("gist-b", Some(1)), 5).await;

        assert!(watch.poll(&ours).await.unwrap());
        assert!(!watch.poll(&ours).await.unwrap());
    }

    #[tokio::test]
    async fn test_watch_ignores_last_update_only_changes() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSettings::new(temp_dir.path().join("settings.json"));
        store.store(&configured("gist-a", None)).await.unwrap();
        let mut watch = SettingsWatch::new(&store).await.unwrap();

        write_later(&store, &configured("gist-a", Some(42)), 5).await;

        assert!(!watch.poll(&store).await.unwrap());
    }

    #[tokio::test]
    async fn test_watch_sees_first_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSettings::new(temp_dir.path().join("settings.json"));
        let mut watch = SettingsWatch::new(&store).await.unwrap();

        store.store(&configured("gist-a", None)).await.unwrap();

        assert!(watch.poll(&store).await.unwrap());
    }
}
