use clap::Args;
use std::time::Duration;

use crate::session::Session;
use crate::storage::SettingsWatch;

/// Keep syncing in the foreground until Ctrl-C
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Seconds between checks of the data files for external edits
    #[arg(long, default_value_t = 2)]
    poll_secs: u64,

    /// Run the first round right away instead of after the debounce delay
    #[arg(long)]
    now: bool,
}

impl WatchCommand {
    pub async fn run(&self, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        let mut settings_watch = SettingsWatch::new(&session.settings).await?;
        let scheduler = session
            .coordinator
            .start()
            .ok_or("sync scheduler already running")?;
        if self.now {
            session.coordinator.schedule(Duration::ZERO);
        }

        let options = session.coordinator.options();
        println!(
            "Watching {} (debounce {}s, every {}s). Press Ctrl-C to stop.",
            session.tree.path().display(),
            options.debounce.as_secs(),
            options.period.as_secs()
        );

        let mut poll = tokio::time::interval(Duration::from_secs(self.poll_secs.max(1)));
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = poll.tick() => {
                    session.poll_external_changes(&mut settings_watch).await;
                }
            }
        }

        println!("Stopping...");
        session.coordinator.shutdown();
        scheduler.await?;
        if let Some(e) = session.coordinator.last_error() {
            println!("Last sync error: {}", e);
        }
        Ok(())
    }
}
