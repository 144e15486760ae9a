//! Marksync Core Library
//!
//! Bookmark tree model and sync engine shared by marksync front-ends.

pub mod adapters;
pub mod models;
pub mod platform;
pub mod sync;

pub use adapters::{
    CreateNode, GistStore, LocalTree, MemoryRemote, MemorySettings, MemoryTree, RemoteDocument,
    RemoteError, RemoteStore, RemoteTarget, SettingsError, SettingsStore, StoredNode, TreeChange,
    TreeDump, TreeError, TreeEvent,
};
pub use models::{Category, Kind, LocalNode, Node, NodeId, Settings, Snapshot, Timestamp};
pub use platform::Platform;
pub use sync::{
    CoordinatorOptions, Direction, PatchStats, RequestOutcome, RoundOutcome, SnapshotBuilder,
    SyncCoordinator, SyncError, SyncState, TreePatcher,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
