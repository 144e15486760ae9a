use clap::Args;

use marksync_core::{LocalTree, Settings, Timestamp};

use crate::config::Config;
use crate::session::Session;

/// Show sync settings and local tree counts
#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn run(
        &self,
        session: &Session,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let settings = session.coordinator.settings().await?;

        println!("Sync Status");
        println!("===========");
        println!();
        print_settings(&settings);
        println!("Platform:    {}", config.platform.value);
        println!(
            "Auto-sync:   {}",
            if config.sync.auto_sync {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!("Tree file:   {}", session.tree.path().display());
        println!();

        if !settings.is_configured() {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, run:");
            println!("  marksync settings set --token <TOKEN> --gist-id <GIST_ID>");
            println!();
        }

        println!("Bookmarks");
        for category in session.tree.categories() {
            let root = session.tree.category_root(category).await?;
            println!("  {:<8} {}", category, root.descendant_count());
        }
        println!("  {:<8} {}", "total", session.tree.tree().len());
        Ok(())
    }
}

pub(crate) fn print_settings(settings: &Settings) {
    println!("Gist:        {}", settings.remote_id().unwrap_or("not set"));
    println!(
        "Token:       {}",
        settings.token().map(mask).unwrap_or_else(|| "not set".into())
    );
    println!(
        "Last update: {}",
        settings
            .last_update
            .map(format_timestamp)
            .unwrap_or_else(|| "never".into())
    );
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{}...", visible)
}

fn format_timestamp(ts: Timestamp) -> String {
    match chrono::DateTime::from_timestamp_millis(ts) {
        Some(dt) => format!("{} ({})", dt.format("%Y-%m-%d %H:%M:%S UTC"), ts),
        None => ts.to_string(),
    }
}
