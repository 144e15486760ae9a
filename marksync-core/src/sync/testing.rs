//! Test adapters wrapping the in-memory ones.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::{broadcast, Notify, Semaphore};

use crate::adapters::{
    CreateNode, LocalTree, MemoryRemote, RemoteDocument, RemoteError, RemoteStore, RemoteTarget,
    TreeError, TreeEvent,
};
use crate::models::{Category, LocalNode, Node, NodeId, Snapshot};

/// Creates `nodes` under a category root, bypassing the patcher.
pub async fn seed(tree: &dyn LocalTree, category: Category, nodes: &[Node]) {
    let root = tree.category_root(category).await.unwrap();
    seed_into(tree, root.id, nodes.to_vec()).await;
}

fn seed_into(tree: &dyn LocalTree, parent: NodeId, nodes: Vec<Node>) -> BoxFuture<'_, ()> {
    async move {
        for (index, node) in nodes.into_iter().enumerate() {
            let created = tree
                .create(CreateNode::from_remote(parent.clone(), index, &node))
                .await
                .unwrap();
            if let Some(children) = node.children {
                seed_into(tree, created.id, children).await;
            }
        }
    }
    .boxed()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Create { index: usize, title: Option<String> },
    Remove(NodeId),
}

/// Records create/remove calls in order.
pub struct RecordingTree<T> {
    inner: T,
    ops: Mutex<Vec<Op>>,
}

impl<T: LocalTree> RecordingTree<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            ops: Mutex::new(Vec::new()),
        }
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().unwrap().clear();
    }
}

#[async_trait]
impl<T: LocalTree> LocalTree for RecordingTree<T> {
    fn categories(&self) -> Vec<Category> {
        self.inner.categories()
    }

    async fn category_root(&self, category: Category) -> Result<LocalNode, TreeError> {
        self.inner.category_root(category).await
    }

    async fn create(&self, request: CreateNode) -> Result<LocalNode, TreeError> {
        self.ops.lock().unwrap().push(Op::Create {
            index: request.index,
            title: request.title.clone(),
        });
        self.inner.create(request).await
    }

    async fn remove_subtree(&self, id: &NodeId) -> Result<(), TreeError> {
        self.ops.lock().unwrap().push(Op::Remove(id.clone()));
        self.inner.remove_subtree(id).await
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<TreeEvent>> {
        self.inner.subscribe()
    }

    fn revision(&self) -> u64 {
        self.inner.revision()
    }
}

/// Fails the `fail_on`-th create call (1-based) once.
pub struct FlakyTree<T> {
    inner: T,
    creates: AtomicUsize,
    fail_on: usize,
}

impl<T: LocalTree> FlakyTree<T> {
    pub fn new(inner: T, fail_on: usize) -> Self {
        Self {
            inner,
            creates: AtomicUsize::new(0),
            fail_on,
        }
    }
}

#[async_trait]
impl<T: LocalTree> LocalTree for FlakyTree<T> {
    fn categories(&self) -> Vec<Category> {
        self.inner.categories()
    }

    async fn category_root(&self, category: Category) -> Result<LocalNode, TreeError> {
        self.inner.category_root(category).await
    }

    async fn create(&self, request: CreateNode) -> Result<LocalNode, TreeError> {
        if self.creates.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
            return Err(TreeError::Storage("injected failure".into()));
        }
        self.inner.create(request).await
    }

    async fn remove_subtree(&self, id: &NodeId) -> Result<(), TreeError> {
        self.inner.remove_subtree(id).await
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<TreeEvent>> {
        self.inner.subscribe()
    }

    fn revision(&self) -> u64 {
        self.inner.revision()
    }
}

/// Remote whose fetches block until [`GatedRemote::open`] is called.
pub struct GatedRemote {
    pub inner: MemoryRemote,
    entered: Notify,
    gate: Semaphore,
}

impl GatedRemote {
    pub fn new(inner: MemoryRemote) -> Self {
        Self {
            inner,
            entered: Notify::new(),
            gate: Semaphore::new(0),
        }
    }

    /// Waits until a fetch is blocked on the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets current and future fetches through.
    pub fn open(&self) {
        self.gate.add_permits(1024);
    }
}

#[async_trait]
impl RemoteStore for GatedRemote {
    async fn fetch(&self, target: &RemoteTarget) -> Result<RemoteDocument, RemoteError> {
        self.entered.notify_one();
        let _permit = self.gate.acquire().await.unwrap();
        self.inner.fetch(target).await
    }

    async fn replace(&self, target: &RemoteTarget, snapshot: &Snapshot) -> Result<(), RemoteError> {
        self.inner.replace(target, snapshot).await
    }
}
