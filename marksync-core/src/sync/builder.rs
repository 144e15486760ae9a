use crate::adapters::{LocalTree, TreeError};
use crate::models::{Node, Snapshot, Timestamp};

/// Reads the local tree into a [`Snapshot`].
pub struct SnapshotBuilder<'a> {
    tree: &'a dyn LocalTree,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(tree: &'a dyn LocalTree) -> Self {
        Self { tree }
    }

    /// Snapshot of every category available on the tree's platform,
    /// stamped with `last_update`.
    pub async fn build(&self, last_update: Timestamp) -> Result<Snapshot, TreeError> {
        let mut snapshot = Snapshot::new(last_update);
        for category in self.tree.categories() {
            let root = self.tree.category_root(category).await?;
            let nodes = root.children().iter().map(Node::from_local).collect();
            snapshot = snapshot.with_category(category, nodes);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryTree;
    use crate::models::Category;
    use crate::platform::Platform;
    use crate::sync::testing::seed;

    #[tokio::test]
    async fn test_build_only_platform_categories() {
        let tree = MemoryTree::new(Platform::Chromium);
        seed(
            &tree,
            Category::Other,
            &[Node::bookmark("a", "https://a"), Node::separator()],
        )
        .await;

        let snapshot = SnapshotBuilder::new(&tree).build(123).await.unwrap();

        assert_eq!(snapshot.last_update, Some(123));
        assert_eq!(snapshot.category(Category::Toolbar), Some(&[][..]));
        assert_eq!(
            snapshot.category(Category::Other).unwrap(),
            &[Node::bookmark("a", "https://a"), Node::separator()][..]
        );
        assert_eq!(snapshot.category(Category::Mobile), None);
        assert_eq!(snapshot.category(Category::Menu), None);
    }

    #[tokio::test]
    async fn test_build_nested_folders() {
        let tree = MemoryTree::new(Platform::Firefox);
        let nodes = vec![Node::folder(
            "Outer",
            vec![Node::folder("Inner", vec![Node::bookmark("deep", "https://deep")])],
        )];
        seed(&tree, Category::Menu, &nodes).await;

        let snapshot = SnapshotBuilder::new(&tree).build(1).await.unwrap();
        assert_eq!(snapshot.category(Category::Menu).unwrap(), &nodes[..]);
        assert_eq!(snapshot.categories().count(), 4);
    }
}
