//! Persisted settings store adapter.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Settings;

/// Errors from the settings store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Read(String),

    #[error("Failed to write settings: {0}")]
    Write(String),

    #[error("Failed to parse settings: {0}")]
    Parse(String),
}

/// Key-value store holding [`Settings`].
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Loads settings; a store with nothing saved yields defaults.
    async fn load(&self) -> Result<Settings, SettingsError>;

    async fn store(&self, settings: &Settings) -> Result<(), SettingsError>;
}
