//! Sync error types.

use thiserror::Error;

use crate::adapters::{RemoteError, SettingsError, TreeError};

/// Why a sync round failed.
///
/// Errors never escape [`SyncCoordinator::request`](super::SyncCoordinator::request);
/// the latest one is kept for inspection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Token or remote id missing. Raised before any I/O.
    #[error("Sync not configured: {0}")]
    NotConfigured(String),

    /// The remote store could not return the whole snapshot. Nothing was modified.
    #[error("Remote snapshot is too large to fetch")]
    RemoteTooLarge,

    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(#[from] RemoteError),

    /// A local create/remove failed; the tree may be partially patched.
    #[error("Local bookmark tree failure: {0}")]
    LocalAdapterFailure(#[from] TreeError),

    #[error("Settings store failure: {0}")]
    Settings(#[from] SettingsError),
}

impl SyncError {
    pub(crate) fn not_logged_in() -> Self {
        SyncError::NotConfigured("you are not logged in, set a token".to_string())
    }

    pub(crate) fn no_remote_id() -> Self {
        SyncError::NotConfigured("remote document id is not set".to_string())
    }
}
