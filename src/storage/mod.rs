//! File-backed stores for the CLI.

mod settings_file;
mod tree_file;

pub use settings_file::{FileSettings, SettingsWatch};
pub use tree_file::FileTree;

use std::path::PathBuf;

use marksync_core::TreeError;

/// Errors from reading or writing the data files.
#[derive(Debug)]
pub enum StorageError {
    Read(PathBuf, std::io::Error),
    Write(PathBuf, std::io::Error),
    Parse(PathBuf, serde_json::Error),
    Tree(TreeError),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Read(path, e) => write!(f, "Failed to read '{}': {}", path.display(), e),
            StorageError::Write(path, e) => {
                write!(f, "Failed to write '{}': {}", path.display(), e)
            }
            StorageError::Parse(path, e) => {
                write!(f, "Failed to parse '{}': {}", path.display(), e)
            }
            StorageError::Tree(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Read(_, e) | StorageError::Write(_, e) => Some(e),
            StorageError::Parse(_, e) => Some(e),
            StorageError::Tree(e) => Some(e),
        }
    }
}

impl From<TreeError> for StorageError {
    fn from(e: TreeError) -> Self {
        StorageError::Tree(e)
    }
}
