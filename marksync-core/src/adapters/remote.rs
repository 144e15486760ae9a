//! Remote snapshot store adapter.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Snapshot;

/// Which remote document to use and the credential to reach it.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub remote_id: String,
    pub token: String,
}

impl RemoteTarget {
    pub fn new(remote_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            remote_id: remote_id.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for RemoteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTarget")
            .field("remote_id", &self.remote_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Result of fetching the remote document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteDocument {
    /// The store could not return the whole payload.
    pub truncated: bool,
    /// The snapshot, if the document holds one.
    pub snapshot: Option<Snapshot>,
}

impl RemoteDocument {
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            truncated: false,
            snapshot: Some(snapshot),
        }
    }

    pub fn truncated() -> Self {
        Self {
            truncated: true,
            snapshot: None,
        }
    }
}

/// Errors from the remote store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Remote store rejected the credentials")]
    Unauthorized,

    #[error("Remote document not found: {0}")]
    NotFound(String),

    #[error("Remote store returned status {0}")]
    Status(u16),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid remote document: {0}")]
    Decode(String),
}

/// Passive JSON storage holding the shared snapshot.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch(&self, target: &RemoteTarget) -> Result<RemoteDocument, RemoteError>;

    /// Replaces the stored snapshot.
    async fn replace(&self, target: &RemoteTarget, snapshot: &Snapshot) -> Result<(), RemoteError>;
}
