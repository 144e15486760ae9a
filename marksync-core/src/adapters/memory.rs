//! In-memory adapters.
//!
//! [`MemoryTree`] is a complete local tree: an arena of nodes keyed by
//! [`NodeId`] with one root per category of its [`Platform`]. Hosts that
//! persist bookmarks themselves wrap it and save its [`TreeDump`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

use super::remote::{RemoteDocument, RemoteError, RemoteStore, RemoteTarget};
use super::settings::{SettingsError, SettingsStore};
use super::tree::{CreateNode, LocalTree, TreeChange, TreeError, TreeEvent};
use crate::models::{Category, Kind, LocalNode, NodeId, Settings, Snapshot};
use crate::platform::Platform;

const EVENT_CAPACITY: usize = 256;

/// Serializable form of a [`MemoryTree`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDump {
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub roots: BTreeMap<Category, StoredNode>,
}

/// One node of a [`TreeDump`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNode {
    pub id: NodeId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Kind>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<StoredNode>>,
}

#[derive(Debug, Clone)]
struct Entry {
    parent: Option<NodeId>,
    kind: Option<Kind>,
    title: String,
    url: Option<String>,
    children: Option<Vec<NodeId>>,
}

#[derive(Debug, Default)]
struct Arena {
    nodes: HashMap<NodeId, Entry>,
    roots: BTreeMap<Category, NodeId>,
    next_id: u64,
    revision: u64,
}

impl Arena {
    fn new(platform: Platform) -> Self {
        let mut arena = Arena::default();
        for &category in platform.categories() {
            let id = arena.root_id(platform, category);
            arena.nodes.insert(
                id.clone(),
                Entry {
                    parent: None,
                    kind: platform.lower(Kind::Folder, None, None).kind,
                    title: String::new(),
                    url: None,
                    children: Some(Vec::new()),
                },
            );
            arena.roots.insert(category, id);
        }
        arena
    }

    fn from_dump(platform: Platform, dump: TreeDump) -> Result<Self, TreeError> {
        let mut arena = Arena::new(platform);
        arena.next_id = dump.next_id;
        for (category, root) in dump.roots {
            let Some(root_id) = arena.roots.get(&category).cloned() else {
                tracing::warn!("Ignoring stored category '{}' not available on {}", category, platform);
                continue;
            };
            for child in root.children.unwrap_or_default() {
                arena.insert_stored(&root_id, child)?;
            }
        }
        Ok(arena)
    }

    fn root_id(&self, platform: Platform, category: Category) -> NodeId {
        NodeId::new(platform.root_id(category).unwrap_or(category.key()))
    }

    fn insert_stored(&mut self, parent: &NodeId, node: StoredNode) -> Result<(), TreeError> {
        if self.nodes.contains_key(&node.id) {
            return Err(TreeError::Storage(format!("duplicate node id {}", node.id)));
        }
        let id = node.id;
        self.nodes.insert(
            id.clone(),
            Entry {
                parent: Some(parent.clone()),
                kind: node.kind,
                title: node.title,
                url: node.url,
                children: node.children.as_ref().map(|_| Vec::new()),
            },
        );
        self.children_mut(parent)?.push(id.clone());
        for child in node.children.unwrap_or_default() {
            self.insert_stored(&id, child)?;
        }
        Ok(())
    }

    fn fresh_id(&mut self) -> NodeId {
        loop {
            self.next_id += 1;
            let id = NodeId::new(self.next_id.to_string());
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    fn entry(&self, id: &NodeId) -> Result<&Entry, TreeError> {
        self.nodes
            .get(id)
            .ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    fn children_mut(&mut self, id: &NodeId) -> Result<&mut Vec<NodeId>, TreeError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::NotFound(id.clone()))?
            .children
            .as_mut()
            .ok_or_else(|| TreeError::NotAFolder(id.clone()))
    }

    fn is_root(&self, id: &NodeId) -> bool {
        self.roots.values().any(|root| root == id)
    }

    fn check_mutable(&self, id: &NodeId) -> Result<(), TreeError> {
        self.entry(id)?;
        if self.is_root(id) {
            return Err(TreeError::RootNode(id.clone()));
        }
        Ok(())
    }

    fn materialize(&self, id: &NodeId) -> Result<LocalNode, TreeError> {
        let entry = self.entry(id)?;
        let children = match &entry.children {
            Some(ids) => Some(
                ids.iter()
                    .map(|child| self.materialize(child))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        Ok(LocalNode {
            id: id.clone(),
            kind: entry.kind,
            title: entry.title.clone(),
            url: entry.url.clone(),
            children,
        })
    }

    fn stored(&self, id: &NodeId) -> Result<StoredNode, TreeError> {
        let node = self.materialize(id)?;
        Ok(to_stored(node))
    }

    fn detach(&mut self, id: &NodeId) -> Result<(), TreeError> {
        let parent = self.entry(id)?.parent.clone();
        if let Some(parent) = parent {
            self.children_mut(&parent)?.retain(|child| child != id);
        }
        Ok(())
    }

    fn drop_subtree(&mut self, id: &NodeId) {
        if let Some(entry) = self.nodes.remove(id) {
            for child in entry.children.unwrap_or_default() {
                self.drop_subtree(&child);
            }
        }
    }

    fn is_within(&self, id: &NodeId, ancestor: &NodeId) -> bool {
        let mut current = Some(id.clone());
        while let Some(node) = current {
            if &node == ancestor {
                return true;
            }
            current = self.nodes.get(&node).and_then(|e| e.parent.clone());
        }
        false
    }
}

fn to_stored(node: LocalNode) -> StoredNode {
    StoredNode {
        id: node.id,
        kind: node.kind,
        title: node.title,
        url: node.url,
        children: node
            .children
            .map(|children| children.into_iter().map(to_stored).collect()),
    }
}

/// In-memory local bookmark tree.
pub struct MemoryTree {
    platform: Platform,
    arena: Mutex<Arena>,
    events: broadcast::Sender<TreeEvent>,
}

impl MemoryTree {
    /// Creates an empty tree with the platform's category roots.
    pub fn new(platform: Platform) -> Self {
        Self::with_arena(platform, Arena::new(platform))
    }

    /// Restores a tree from a dump.
    pub fn from_dump(platform: Platform, dump: TreeDump) -> Result<Self, TreeError> {
        Ok(Self::with_arena(platform, Arena::from_dump(platform, dump)?))
    }

    fn with_arena(platform: Platform, arena: Arena) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            platform,
            arena: Mutex::new(arena),
            events,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Serializable copy of the whole tree.
    pub fn dump(&self) -> TreeDump {
        let arena = self.lock();
        let roots = arena
            .roots
            .iter()
            .filter_map(|(category, id)| arena.stored(id).ok().map(|node| (*category, node)))
            .collect();
        TreeDump {
            next_id: arena.next_id,
            roots,
        }
    }

    /// Replaces the whole tree with `dump`, keeping the revision counter.
    pub fn replace_with(&self, dump: TreeDump) -> Result<(), TreeError> {
        let fresh = Arena::from_dump(self.platform, dump)?;
        let revision = {
            let mut arena = self.lock();
            let revision = arena.revision + 1;
            *arena = fresh;
            arena.revision = revision;
            revision
        };
        self.emit(revision, TreeChange::Reloaded, None);
        Ok(())
    }

    /// Reads one node with its subtree.
    pub fn get(&self, id: &NodeId) -> Result<LocalNode, TreeError> {
        self.lock().materialize(id)
    }

    /// Number of nodes, category roots excluded.
    pub fn len(&self) -> usize {
        let arena = self.lock();
        arena.nodes.len() - arena.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Changes a node's title and/or url.
    pub fn update(
        &self,
        id: &NodeId,
        title: Option<String>,
        url: Option<String>,
    ) -> Result<LocalNode, TreeError> {
        let (revision, node) = {
            let mut arena = self.lock();
            arena.check_mutable(id)?;
            let entry = arena
                .nodes
                .get_mut(id)
                .ok_or_else(|| TreeError::NotFound(id.clone()))?;
            if let Some(title) = title {
                entry.title = title;
            }
            if url.is_some() && entry.children.is_none() {
                entry.url = url;
            }
            arena.revision += 1;
            (arena.revision, arena.materialize(id)?)
        };
        self.emit(revision, TreeChange::Changed, Some(id.clone()));
        Ok(node)
    }

    /// Moves a node under `parent` at `index` (clamped to the end).
    pub fn move_node(&self, id: &NodeId, parent: &NodeId, index: usize) -> Result<(), TreeError> {
        let revision = {
            let mut arena = self.lock();
            arena.check_mutable(id)?;
            if arena.entry(parent)?.children.is_none() {
                return Err(TreeError::NotAFolder(parent.clone()));
            }
            if arena.is_within(parent, id) {
                return Err(TreeError::Cycle(id.clone()));
            }
            arena.detach(id)?;
            let siblings = arena.children_mut(parent)?;
            let index = index.min(siblings.len());
            siblings.insert(index, id.clone());
            if let Some(entry) = arena.nodes.get_mut(id) {
                entry.parent = Some(parent.clone());
            }
            arena.revision += 1;
            arena.revision
        };
        self.emit(revision, TreeChange::Moved, Some(id.clone()));
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Arena> {
        self.arena.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, revision: u64, change: TreeChange, id: Option<NodeId>) {
        // No subscribers is fine.
        let _ = self.events.send(TreeEvent {
            revision,
            change,
            id,
        });
    }
}

#[async_trait]
impl LocalTree for MemoryTree {
    fn categories(&self) -> Vec<Category> {
        self.platform.categories().to_vec()
    }

    async fn category_root(&self, category: Category) -> Result<LocalNode, TreeError> {
        let arena = self.lock();
        let root = arena
            .roots
            .get(&category)
            .ok_or(TreeError::UnknownCategory(category))?;
        arena.materialize(root)
    }

    async fn create(&self, request: CreateNode) -> Result<LocalNode, TreeError> {
        let fields = self.platform.lower(
            request.kind,
            request.title.as_deref(),
            request.url.as_deref(),
        );
        let (revision, node) = {
            let mut arena = self.lock();
            arena.entry(&request.parent_id)?;
            let id = arena.fresh_id();
            let siblings = arena.children_mut(&request.parent_id)?;
            let index = request.index.min(siblings.len());
            siblings.insert(index, id.clone());
            arena.nodes.insert(
                id.clone(),
                Entry {
                    parent: Some(request.parent_id.clone()),
                    kind: fields.kind,
                    title: fields.title,
                    url: fields.url,
                    children: (request.kind == Kind::Folder).then(Vec::new),
                },
            );
            arena.revision += 1;
            (arena.revision, arena.materialize(&id)?)
        };
        self.emit(revision, TreeChange::Created, Some(node.id.clone()));
        Ok(node)
    }

    async fn remove_subtree(&self, id: &NodeId) -> Result<(), TreeError> {
        let revision = {
            let mut arena = self.lock();
            arena.check_mutable(id)?;
            arena.detach(id)?;
            arena.drop_subtree(id);
            arena.revision += 1;
            arena.revision
        };
        self.emit(revision, TreeChange::Removed, Some(id.clone()));
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<TreeEvent>> {
        Some(self.events.subscribe())
    }

    fn revision(&self) -> u64 {
        self.lock().revision
    }
}

/// In-memory remote store keyed by remote id.
///
/// A remote id with nothing stored behaves like an empty document.
#[derive(Default)]
pub struct MemoryRemote {
    documents: Mutex<HashMap<String, RemoteDocument>>,
    required_token: Option<String>,
    fetches: AtomicUsize,
    replaces: AtomicUsize,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every request whose token differs from `token`.
    pub fn with_required_token(mut self, token: impl Into<String>) -> Self {
        self.required_token = Some(token.into());
        self
    }

    pub fn put(&self, remote_id: impl Into<String>, document: RemoteDocument) {
        self.lock().insert(remote_id.into(), document);
    }

    pub fn snapshot(&self, remote_id: &str) -> Option<Snapshot> {
        self.lock().get(remote_id).and_then(|doc| doc.snapshot.clone())
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn replace_count(&self) -> usize {
        self.replaces.load(Ordering::SeqCst)
    }

    fn authorize(&self, target: &RemoteTarget) -> Result<(), RemoteError> {
        match &self.required_token {
            Some(token) if token != &target.token => Err(RemoteError::Unauthorized),
            _ => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RemoteDocument>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn fetch(&self, target: &RemoteTarget) -> Result<RemoteDocument, RemoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.authorize(target)?;
        Ok(self.lock().get(&target.remote_id).cloned().unwrap_or_default())
    }

    async fn replace(&self, target: &RemoteTarget, snapshot: &Snapshot) -> Result<(), RemoteError> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        self.authorize(target)?;
        self.put(
            target.remote_id.clone(),
            RemoteDocument::with_snapshot(snapshot.clone()),
        );
        Ok(())
    }
}

/// In-memory settings store.
#[derive(Default)]
pub struct MemorySettings {
    settings: Mutex<Settings>,
}

impl MemorySettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }

    /// Current value without going through the async trait.
    pub fn current(&self) -> Settings {
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn load(&self) -> Result<Settings, SettingsError> {
        Ok(self.current())
    }

    async fn store(&self, settings: &Settings) -> Result<(), SettingsError> {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = settings.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(parent: &NodeId, index: usize, title: &str) -> CreateNode {
        CreateNode {
            parent_id: parent.clone(),
            index,
            kind: Kind::Bookmark,
            title: Some(title.to_string()),
            url: Some(format!("https://{}.example", title)),
        }
    }

    fn titles(node: &LocalNode) -> Vec<String> {
        node.children().iter().map(|c| c.title.clone()).collect()
    }

    #[tokio::test]
    async fn test_roots_per_platform() {
        let firefox = MemoryTree::new(Platform::Firefox);
        assert_eq!(firefox.categories().len(), 4);
        let root = firefox.category_root(Category::Toolbar).await.unwrap();
        assert_eq!(root.id.as_str(), "toolbar_____");

        let chromium = MemoryTree::new(Platform::Chromium);
        let err = chromium.category_root(Category::Menu).await.unwrap_err();
        assert_eq!(err, TreeError::UnknownCategory(Category::Menu));
    }

    #[tokio::test]
    async fn test_create_at_index() {
        let tree = MemoryTree::new(Platform::Firefox);
        let root = tree.category_root(Category::Toolbar).await.unwrap().id;

        tree.create(bookmark(&root, 0, "c")).await.unwrap();
        tree.create(bookmark(&root, 0, "a")).await.unwrap();
        tree.create(bookmark(&root, 1, "b")).await.unwrap();
        tree.create(bookmark(&root, 99, "d")).await.unwrap();

        let root = tree.category_root(Category::Toolbar).await.unwrap();
        assert_eq!(titles(&root), vec!["a", "b", "c", "d"]);
        assert_eq!(tree.len(), 4);
    }

    #[tokio::test]
    async fn test_create_under_bookmark_fails() {
        let tree = MemoryTree::new(Platform::Firefox);
        let root = tree.category_root(Category::Other).await.unwrap().id;
        let leaf = tree.create(bookmark(&root, 0, "leaf")).await.unwrap();

        let err = tree.create(bookmark(&leaf.id, 0, "x")).await.unwrap_err();
        assert_eq!(err, TreeError::NotAFolder(leaf.id));
    }

    #[tokio::test]
    async fn test_remove_subtree() {
        let tree = MemoryTree::new(Platform::Firefox);
        let root = tree.category_root(Category::Toolbar).await.unwrap().id;
        let folder = tree
            .create(CreateNode {
                parent_id: root.clone(),
                index: 0,
                kind: Kind::Folder,
                title: Some("Work".into()),
                url: None,
            })
            .await
            .unwrap();
        let inner = tree.create(bookmark(&folder.id, 0, "inner")).await.unwrap();

        tree.remove_subtree(&folder.id).await.unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.get(&inner.id).unwrap_err(), TreeError::NotFound(inner.id));
        assert_eq!(
            tree.remove_subtree(&root).await.unwrap_err(),
            TreeError::RootNode(root)
        );
    }

    #[tokio::test]
    async fn test_events_carry_revision() {
        let tree = MemoryTree::new(Platform::Firefox);
        let mut events = tree.subscribe().unwrap();
        let root = tree.category_root(Category::Toolbar).await.unwrap().id;

        let node = tree.create(bookmark(&root, 0, "a")).await.unwrap();
        tree.update(&node.id, Some("renamed".into()), None).unwrap();

        let created = events.recv().await.unwrap();
        assert_eq!(created.change, TreeChange::Created);
        assert_eq!(created.revision, 1);
        let changed = events.recv().await.unwrap();
        assert_eq!(changed.change, TreeChange::Changed);
        assert_eq!(changed.revision, 2);
        assert_eq!(tree.revision(), 2);
    }

    #[tokio::test]
    async fn test_move_node_rejects_cycles() {
        let tree = MemoryTree::new(Platform::Firefox);
        let root = tree.category_root(Category::Toolbar).await.unwrap().id;
        let folder = |title: &str, parent: &NodeId| CreateNode {
            parent_id: parent.clone(),
            index: 0,
            kind: Kind::Folder,
            title: Some(title.to_string()),
            url: None,
        };
        let outer = tree.create(folder("outer", &root)).await.unwrap();
        let inner = tree.create(folder("inner", &outer.id)).await.unwrap();

        assert_eq!(
            tree.move_node(&outer.id, &inner.id, 0).unwrap_err(),
            TreeError::Cycle(outer.id.clone())
        );

        tree.move_node(&inner.id, &root, 5).unwrap();
        let root = tree.category_root(Category::Toolbar).await.unwrap();
        assert_eq!(titles(&root), vec!["outer", "inner"]);
    }

    #[tokio::test]
    async fn test_dump_restores_identity() {
        let tree = MemoryTree::new(Platform::Chromium);
        let root = tree.category_root(Category::Toolbar).await.unwrap().id;
        let created = tree.create(bookmark(&root, 0, "kept")).await.unwrap();

        let json = serde_json::to_string(&tree.dump()).unwrap();
        let restored =
            MemoryTree::from_dump(Platform::Chromium, serde_json::from_str(&json).unwrap())
                .unwrap();

        let node = restored.get(&created.id).unwrap();
        assert_eq!(node.title, "kept");
        let next = restored.create(bookmark(&root, 1, "new")).await.unwrap();
        assert_ne!(next.id, created.id);
    }

    #[tokio::test]
    async fn test_memory_remote_auth() {
        let remote = MemoryRemote::new().with_required_token("good");
        let err = remote
            .fetch(&RemoteTarget::new("gist", "bad"))
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::Unauthorized);

        let doc = remote
            .fetch(&RemoteTarget::new("gist", "good"))
            .await
            .unwrap();
        assert!(doc.snapshot.is_none());
        assert_eq!(remote.fetch_count(), 2);
    }
}
