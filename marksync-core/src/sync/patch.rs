//! Ordered-tree patching.
//!
//! Reconciles a local folder against a remote node list with a two-pointer
//! scan and one element of lookahead:
//!
//! - `local[i]` matches `remote[j]`: same node, recurse if folder, advance both
//! - `local[i]` matches `remote[j + 1]`: `remote[j]` is new, create it at `j`
//! - otherwise `local[i]` is gone remotely, remove its subtree
//!
//! Leftover remote nodes are appended, leftover local nodes removed. This is
//! not a minimal edit script: a reorder shows up as create + remove, never as
//! a move. Matched nodes keep their identity.
//!
//! Every adapter call is awaited before the next, so indices stay valid.
//! Nothing is transactional; after a failure the next run re-diffs from
//! whatever state the tree is in and converges the same way.

use futures::future::{BoxFuture, FutureExt};
use std::ops::AddAssign;

use crate::adapters::{CreateNode, LocalTree, TreeError};
use crate::models::{same_shallow, BookmarkShape, Category, Kind, LocalNode, Node, NodeId};

/// Counts of what a patch did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    /// Local nodes kept as-is
    pub matched: usize,
    /// Nodes created, including those inside created folders
    pub created: usize,
    /// Subtrees removed
    pub removed: usize,
}

impl PatchStats {
    /// True if the local tree was not touched.
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.removed == 0
    }
}

impl AddAssign for PatchStats {
    fn add_assign(&mut self, other: Self) {
        self.matched += other.matched;
        self.created += other.created;
        self.removed += other.removed;
    }
}

/// Applies remote node lists onto a [`LocalTree`].
pub struct TreePatcher<'a> {
    tree: &'a dyn LocalTree,
}

impl<'a> TreePatcher<'a> {
    pub fn new(tree: &'a dyn LocalTree) -> Self {
        Self { tree }
    }

    /// Patches one category root so its children match `remote`.
    pub async fn patch_category(
        &self,
        category: Category,
        remote: &[Node],
    ) -> Result<PatchStats, TreeError> {
        let root = self.tree.category_root(category).await?;
        self.patch_folder(&root.id, root.children(), remote).await
    }

    /// Patches the children of `parent`, currently `local`, to match `remote`.
    pub fn patch_folder<'b>(
        &'b self,
        parent: &'b NodeId,
        local: &'b [LocalNode],
        remote: &'b [Node],
    ) -> BoxFuture<'b, Result<PatchStats, TreeError>> {
        async move {
            let mut stats = PatchStats::default();
            let (mut i, mut j) = (0, 0);

            while i < local.len() && j < remote.len() {
                let current = &local[i];
                if same_shallow(current, &remote[j]) {
                    if current.kind() == Kind::Folder {
                        stats += self
                            .patch_folder(&current.id, current.children(), remote[j].children())
                            .await?;
                    }
                    stats.matched += 1;
                    i += 1;
                    j += 1;
                } else if remote
                    .get(j + 1)
                    .is_some_and(|next| same_shallow(current, next))
                {
                    stats += self.insert(parent, j, &remote[j]).await?;
                    j += 1;
                } else {
                    self.remove(current).await?;
                    stats.removed += 1;
                    i += 1;
                }
            }

            for leftover in &local[i..] {
                self.remove(leftover).await?;
                stats.removed += 1;
            }
            for (index, node) in remote.iter().enumerate().skip(j) {
                stats += self.insert(parent, index, node).await?;
            }

            Ok(stats)
        }
        .boxed()
    }

    async fn insert(
        &self,
        parent: &NodeId,
        index: usize,
        node: &Node,
    ) -> Result<PatchStats, TreeError> {
        let request = CreateNode::from_remote(parent.clone(), index, node);
        tracing::debug!(
            "Creating {} '{}' under {} at {}",
            request.kind,
            request.title.as_deref().unwrap_or_default(),
            parent,
            index
        );
        let created = self.tree.create(request).await?;

        let mut stats = PatchStats {
            created: 1,
            ..PatchStats::default()
        };
        if node.kind() == Kind::Folder && !node.children().is_empty() {
            stats += self
                .patch_folder(&created.id, created.children(), node.children())
                .await?;
        }
        Ok(stats)
    }

    async fn remove(&self, node: &LocalNode) -> Result<(), TreeError> {
        tracing::debug!("Removing {} '{}' ({})", node.kind(), node.title, node.id);
        self.tree.remove_subtree(&node.id).await
    }
}
