use clap::{Args, Subcommand, ValueEnum};
use std::path::Path;

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write a default config file
    Init,
}

impl ConfigCommand {
    pub fn run(&self, config: &Config, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!("Config file: {} (not found)", path.display());
                        }
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        println!("platform: {}", config.platform.value);
                        println!("  source: {}", config.platform.source);
                        println!();

                        println!("sync:");
                        println!("  debounce_secs: {}", config.sync.debounce_secs);
                        println!("  period_secs: {}", config.sync.period_secs);
                        println!("  auto_sync: {}", config.sync.auto_sync);
                        println!("  api_url: {}", config.sync.api_url);
                    }
                }
                Ok(())
            }
            ConfigSubcommand::Init => {
                Config::init_file(path)?;
                println!("✓ Wrote {}", path.display());
                Ok(())
            }
        }
    }
}
