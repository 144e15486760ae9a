//! Local bookmark tree adapter.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::models::{BookmarkShape, Category, Kind, LocalNode, Node, NodeId};

/// Request to create one node under `parent_id` at `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNode {
    pub parent_id: NodeId,
    pub index: usize,
    pub kind: Kind,
    pub title: Option<String>,
    pub url: Option<String>,
}

impl CreateNode {
    /// Builds a request from a snapshot node, carrying only the fields
    /// meaningful for its kind. Children are created separately.
    pub fn from_remote(parent_id: NodeId, index: usize, node: &Node) -> Self {
        let kind = node.kind();
        let (title, url) = match kind {
            Kind::Folder => (node.title.clone(), None),
            Kind::Bookmark => (node.title.clone(), node.url.clone()),
            Kind::Separator => (None, None),
        };
        Self {
            parent_id,
            index,
            kind,
            title,
            url,
        }
    }
}

/// What happened to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeChange {
    Created,
    Removed,
    Changed,
    Moved,
    /// The whole tree was replaced, e.g. reloaded from disk.
    Reloaded,
}

/// Change notification. `revision` is the tree revision after the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEvent {
    pub revision: u64,
    pub change: TreeChange,
    pub id: Option<NodeId>,
}

/// Errors from the local tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Bookmark node not found: {0}")]
    NotFound(NodeId),

    #[error("Category '{0}' is not available on this platform")]
    UnknownCategory(Category),

    #[error("Bookmark node {0} is not a folder")]
    NotAFolder(NodeId),

    #[error("Category root {0} cannot be modified")]
    RootNode(NodeId),

    #[error("Cannot move {0} into its own subtree")]
    Cycle(NodeId),

    #[error("Bookmark storage error: {0}")]
    Storage(String),
}

/// The local, independently mutable bookmark tree.
///
/// Nodes are addressed only by [`NodeId`]; callers re-read subtrees rather
/// than holding on to nodes across calls.
#[async_trait]
pub trait LocalTree: Send + Sync {
    /// Categories that exist on this tree's platform.
    fn categories(&self) -> Vec<Category>;

    /// The root folder of a category with its full subtree.
    async fn category_root(&self, category: Category) -> Result<LocalNode, TreeError>;

    /// Creates a node and returns it with its new identity.
    async fn create(&self, request: CreateNode) -> Result<LocalNode, TreeError>;

    /// Removes a node and everything below it.
    async fn remove_subtree(&self, id: &NodeId) -> Result<(), TreeError>;

    /// Subscribes to change notifications, if the tree emits them.
    fn subscribe(&self) -> Option<broadcast::Receiver<TreeEvent>> {
        None
    }

    /// Monotonic counter bumped by every change.
    fn revision(&self) -> u64 {
        0
    }
}
