//! One-shot sync round.

use clap::Args;

use marksync_core::{RequestOutcome, RoundOutcome};

use crate::session::Session;

/// Sync with the configured gist now
#[derive(Debug, Args)]
pub struct SyncCommand {}

impl SyncCommand {
    pub async fn run(&self, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        println!("Syncing bookmarks...");
        match session.coordinator.request().await {
            RequestOutcome::Failed(e) => Err(e.into()),
            outcome => {
                print_outcome(&outcome);
                Ok(())
            }
        }
    }
}

pub fn print_outcome(outcome: &RequestOutcome) {
    match outcome {
        RequestOutcome::Completed(RoundOutcome::Applied { stats, .. }) => {
            if stats.is_noop() {
                println!("✓ Remote snapshot applied (no changes)");
            } else {
                println!(
                    "✓ Remote snapshot applied: {} created, {} removed, {} unchanged",
                    stats.created, stats.removed, stats.matched
                );
            }
        }
        RequestOutcome::Completed(RoundOutcome::Pushed { .. }) => {
            println!("✓ Local bookmarks pushed");
        }
        RequestOutcome::Completed(RoundOutcome::UpToDate) => println!("✓ Already up to date"),
        RequestOutcome::Failed(e) => println!("✗ Sync failed: {}", e),
        RequestOutcome::Coalesced => println!("Sync already running, another round is queued"),
    }
}
