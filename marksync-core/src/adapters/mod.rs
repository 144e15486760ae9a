//! Collaborators the sync engine talks to.
//!
//! - [`LocalTree`]: the device's bookmark tree
//! - [`RemoteStore`]: passive JSON storage holding the shared snapshot
//! - [`SettingsStore`]: token, remote id and last update timestamp
//!
//! In-memory implementations of all three live in [`memory`]; [`GistStore`]
//! is the production remote store.

pub mod gist;
pub mod memory;
mod remote;
mod settings;
mod tree;

pub use gist::GistStore;
pub use memory::{MemoryRemote, MemorySettings, MemoryTree, StoredNode, TreeDump};
pub use remote::{RemoteDocument, RemoteError, RemoteStore, RemoteTarget};
pub use settings::{SettingsError, SettingsStore};
pub use tree::{CreateNode, LocalTree, TreeChange, TreeError, TreeEvent};
