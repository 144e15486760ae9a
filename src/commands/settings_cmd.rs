use clap::{Args, Subcommand};

use crate::config::Config;
use crate::session::Session;

use super::status::print_settings;

/// Show or change the sync token and gist id
#[derive(Args)]
pub struct SettingsCommand {
    #[command(subcommand)]
    command: SettingsSubcommand,
}

#[derive(Subcommand)]
enum SettingsSubcommand {
    /// Show current settings (token masked)
    Show,

    /// Change settings
    Set {
        /// GitHub token with gist scope
        #[arg(long)]
        token: Option<String>,

        /// Id of the gist holding the snapshot
        #[arg(long)]
        gist_id: Option<String>,

        /// Forget the last sync timestamp so the next round adopts the remote
        #[arg(long)]
        clear_last_update: bool,

        /// Read MARKSYNC_TOKEN and MARKSYNC_GIST_ID
        #[arg(long)]
        from_env: bool,
    },
}

impl SettingsCommand {
    pub async fn run(
        &self,
        session: &Session,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            SettingsSubcommand::Show => {
                let settings = session.coordinator.settings().await?;
                print_settings(&settings);
            }
            SettingsSubcommand::Set {
                token,
                gist_id,
                clear_last_update,
                from_env,
            } => {
                let previous = session.coordinator.settings().await?;
                let mut settings = previous.clone();
                if *from_env {
                    if let Ok(value) = std::env::var("MARKSYNC_TOKEN") {
                        settings.token = Some(value);
                    }
                    if let Ok(value) = std::env::var("MARKSYNC_GIST_ID") {
                        settings.remote_id = Some(value);
                    }
                }
                if let Some(value) = token {
                    settings.token = Some(value.clone());
                }
                if let Some(value) = gist_id {
                    settings.remote_id = Some(value.clone());
                }
                if *clear_last_update {
                    settings.last_update = None;
                }

                session.coordinator.set_settings(settings.clone()).await?;
                println!("✓ Settings saved to {}", session.settings.path().display());

                if previous.target_differs(&settings) && settings.is_configured() {
                    if config.sync.auto_sync {
                        let outcome = session.coordinator.request().await;
                        super::print_outcome(&outcome);
                    } else {
                        println!("Sync target changed. Run 'marksync sync' to sync now.");
                    }
                }
            }
        }
        Ok(())
    }
}
