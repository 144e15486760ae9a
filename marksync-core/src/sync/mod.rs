//! Sync engine: conflict resolution, tree patching and the round coordinator.

pub mod builder;
mod conflict;
mod coordinator;
mod error;
mod patch;
#[cfg(test)]
mod testing;

pub use builder::SnapshotBuilder;
pub use conflict::{decide, Direction, RemoteState};
pub use coordinator::{
    CoordinatorOptions, RequestOutcome, RoundOutcome, SyncCoordinator, SyncState,
    DEFAULT_DEBOUNCE, DEFAULT_PERIOD,
};
pub use error::SyncError;
pub use patch::{PatchStats, TreePatcher};
