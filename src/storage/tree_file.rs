use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;
use tokio::sync::broadcast;

use marksync_core::models::{Category, LocalNode, NodeId};
use marksync_core::{
    CreateNode, LocalTree, MemoryTree, Platform, TreeDump, TreeError, TreeEvent,
};

use super::StorageError;

/// A [`MemoryTree`] persisted to a JSON file after every mutation.
///
/// Edits made to the file by someone else are picked up by
/// [`FileTree::reload_if_changed`], which replaces the tree and emits a
/// change notification. Every read of a category root and every mutation
/// reloads first, so a write never clobbers an edit it has not seen.
pub struct FileTree {
    path: PathBuf,
    tree: MemoryTree,
    /// File mtime as of our last read or write
    modified: Mutex<Option<SystemTime>>,
}

impl FileTree {
    /// Opens the tree file, starting empty if it doesn't exist.
    pub fn open(path: PathBuf, platform: Platform) -> Result<Self, StorageError> {
        let tree = match read_dump(&path)? {
            Some(dump) => MemoryTree::from_dump(platform, dump)?,
            None => MemoryTree::new(platform),
        };
        let modified = Mutex::new(modified_time(&path));
        Ok(Self {
            path,
            tree,
            modified,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tree(&self) -> &MemoryTree {
        &self.tree
    }

    /// Writes the tree to disk.
    pub fn save(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Write(parent.to_path_buf(), e))?;
        }
        let json = serde_json::to_string_pretty(&self.tree.dump())
            .map_err(|e| StorageError::Write(self.path.clone(), e.into()))?;
        fs::write(&self.path, json).map_err(|e| StorageError::Write(self.path.clone(), e))?;
        *self.lock_modified() = modified_time(&self.path);
        Ok(())
    }

    /// Reloads the tree if the file changed since we last touched it.
    ///
    /// Returns true if the tree was replaced.
    pub fn reload_if_changed(&self) -> Result<bool, StorageError> {
        let current = modified_time(&self.path);
        if *self.lock_modified() == current {
            return Ok(false);
        }
        let Some(dump) = read_dump(&self.path)? else {
            *self.lock_modified() = current;
            return Ok(false);
        };
        self.tree.replace_with(dump)?;
        *self.lock_modified() = current;
        tracing::info!("Reloaded {} after external change", self.path.display());
        Ok(true)
    }

    pub fn update(
        &self,
        id: &NodeId,
        title: Option<String>,
        url: Option<String>,
    ) -> Result<LocalNode, StorageError> {
        self.reload_if_changed()?;
        let node = self.tree.update(id, title, url)?;
        self.save()?;
        Ok(node)
    }

    pub fn move_node(&self, id: &NodeId, parent: &NodeId, index: usize) -> Result<(), StorageError> {
        self.reload_if_changed()?;
        self.tree.move_node(id, parent, index)?;
        self.save()
    }

    fn refresh(&self) -> Result<(), TreeError> {
        self.reload_if_changed()
            .map(|_| ())
            .map_err(|e| TreeError::Storage(e.to_string()))
    }

    fn persist(&self) -> Result<(), TreeError> {
        self.save().map_err(|e| TreeError::Storage(e.to_string()))
    }

    fn lock_modified(&self) -> std::sync::MutexGuard<'_, Option<SystemTime>> {
        self.modified.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LocalTree for FileTree {
    fn categories(&self) -> Vec<Category> {
        self.tree.categories()
    }

    async fn category_root(&self, category: Category) -> Result<LocalNode, TreeError> {
        self.refresh()?;
        self.tree.category_root(category).await
    }

    async fn create(&self, request: CreateNode) -> Result<LocalNode, TreeError> {
        self.refresh()?;
        let node = self.tree.create(request).await?;
        self.persist()?;
        Ok(node)
    }

    async fn remove_subtree(&self, id: &NodeId) -> Result<(), TreeError> {
        self.refresh()?;
        self.tree.remove_subtree(id).await?;
        self.persist()
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<TreeEvent>> {
        self.tree.subscribe()
    }

    fn revision(&self) -> u64 {
        self.tree.revision()
    }
}

fn read_dump(path: &Path) -> Result<Option<TreeDump>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents =
        fs::read_to_string(path).map_err(|e| StorageError::Read(path.to_path_buf(), e))?;
    let dump = serde_json::from_str(&contents)
        .map_err(|e| StorageError::Parse(path.to_path_buf(), e))?;
    Ok(Some(dump))
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
