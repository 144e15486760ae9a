//! Bookmark tree nodes and the rules that classify and compare them.
//!
//! Two shapes share the same rules: [`Node`] is the value form stored in a
//! snapshot, [`LocalNode`] is what a local tree hands out and carries the
//! identity used to mutate it. Both implement [`BookmarkShape`], so a local
//! node can be compared against a remote one directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a bookmark tree entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Folder,
    Bookmark,
    Separator,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Folder => "folder",
            Kind::Bookmark => "bookmark",
            Kind::Separator => "separator",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identity a local tree assigns to one of its nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The fields that decide what a node is and whether two nodes match.
pub trait BookmarkShape {
    /// Explicit kind tag, when the source carries one.
    fn kind_tag(&self) -> Option<Kind>;
    fn title(&self) -> Option<&str>;
    fn url(&self) -> Option<&str>;
    fn has_children(&self) -> bool;

    fn kind(&self) -> Kind {
        classify(self)
    }
}

/// Classifies a node: explicit tag first, then folder (children or no url),
/// then separator (all-dash title), otherwise bookmark.
pub fn classify<N: BookmarkShape + ?Sized>(node: &N) -> Kind {
    if let Some(kind) = node.kind_tag() {
        return kind;
    }
    if node.has_children() || node.url().is_none() {
        return Kind::Folder;
    }
    match node.title() {
        Some(title) if is_separator_title(title) => Kind::Separator,
        _ => Kind::Bookmark,
    }
}

fn is_separator_title(title: &str) -> bool {
    !title.is_empty() && title.bytes().all(|b| b == b'-')
}

/// Shallow equality: same kind and same meaningful title/url. Children are
/// never compared. Separators carry no meaningful fields, and a folder's url
/// is always ignored.
pub fn same_shallow<A, B>(a: &A, b: &B) -> bool
where
    A: BookmarkShape + ?Sized,
    B: BookmarkShape + ?Sized,
{
    let kind = a.kind();
    if kind != b.kind() {
        return false;
    }
    let same_title = || a.title().unwrap_or_default() == b.title().unwrap_or_default();
    match kind {
        Kind::Separator => true,
        Kind::Folder => same_title(),
        Kind::Bookmark => same_title() && a.url() == b.url(),
    }
}

/// A snapshot node: pure value data with no local identity.
///
/// On the wire every field is optional; `type` is written by this crate but
/// may be missing in documents produced elsewhere, in which case the kind is
/// inferred by [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Kind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

impl Node {
    pub fn folder(title: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            kind: Some(Kind::Folder),
            title: Some(title.into()),
            url: None,
            children: Some(children),
        }
    }

    pub fn bookmark(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: Some(Kind::Bookmark),
            title: Some(title.into()),
            url: Some(url.into()),
            children: None,
        }
    }

    pub fn separator() -> Self {
        Self {
            kind: Some(Kind::Separator),
            ..Self::default()
        }
    }

    /// Children in order; a folder without a `children` field is empty.
    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Canonical value form of a local node, identity stripped, recursively.
    pub fn from_local(local: &LocalNode) -> Self {
        match local.kind() {
            Kind::Folder => Node::folder(
                local.title.clone(),
                local.children().iter().map(Node::from_local).collect(),
            ),
            Kind::Bookmark => Self {
                kind: Some(Kind::Bookmark),
                title: Some(local.title.clone()),
                url: local.url.clone(),
                children: None,
            },
            Kind::Separator => Node::separator(),
        }
    }
}

impl BookmarkShape for Node {
    fn kind_tag(&self) -> Option<Kind> {
        self.kind
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn has_children(&self) -> bool {
        self.children.is_some()
    }
}

/// A node as read from the local tree, addressable by `id`.
///
/// Fields are whatever the platform stores: a platform without kind tags
/// leaves `kind` empty and may carry placeholder title/url for separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNode {
    pub id: NodeId,
    pub kind: Option<Kind>,
    pub title: String,
    pub url: Option<String>,
    pub children: Option<Vec<LocalNode>>,
}

impl LocalNode {
    pub fn children(&self) -> &[LocalNode] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children()
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

impl BookmarkShape for LocalNode {
    fn kind_tag(&self) -> Option<Kind> {
        self.kind
    }

    fn title(&self) -> Option<&str> {
        Some(&self.title)
    }

    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn has_children(&self) -> bool {
        self.children.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn untagged(title: &str, url: Option<&str>) -> Node {
        Node {
            kind: None,
            title: Some(title.to_string()),
            url: url.map(str::to_string),
            children: None,
        }
    }

    fn local(id: &str, kind: Option<Kind>, title: &str, url: Option<&str>) -> LocalNode {
        LocalNode {
            id: NodeId::new(id),
            kind,
            title: title.to_string(),
            url: url.map(str::to_string),
            children: None,
        }
    }

    #[test]
    fn test_explicit_tag_wins() {
        let node = Node {
            kind: Some(Kind::Bookmark),
            title: Some("---".into()),
            url: None,
            children: Some(vec![]),
        };
        assert_eq!(node.kind(), Kind::Bookmark);
    }

    #[test]
    fn test_classify_without_tag() {
        assert_eq!(untagged("Docs", None).kind(), Kind::Folder);
        assert_eq!(
            untagged("-----", Some("about:blank")).kind(),
            Kind::Separator
        );
        assert_eq!(
            untagged("Rust", Some("https://rust-lang.org")).kind(),
            Kind::Bookmark
        );

        let mut with_children = untagged("Has url", Some("https://example.com"));
        with_children.children = Some(vec![]);
        assert_eq!(with_children.kind(), Kind::Folder);
    }

    #[test]
    fn test_dash_rule_needs_only_dashes() {
        assert_eq!(untagged("-- x --", Some("https://a")).kind(), Kind::Bookmark);
        assert_eq!(untagged("", Some("https://a")).kind(), Kind::Bookmark);
    }

    #[test]
    fn test_malformed_bookmark_is_classified_not_rejected() {
        let node = Node {
            kind: None,
            title: None,
            url: Some("https://example.com".into()),
            children: None,
        };
        assert_eq!(node.kind(), Kind::Bookmark);
    }

    #[test]
    fn test_same_shallow_bookmarks() {
        let a = Node::bookmark("Rust", "https://rust-lang.org");
        assert!(same_shallow(&a, &Node::bookmark("Rust", "https://rust-lang.org")));
        assert!(!same_shallow(&a, &Node::bookmark("Rust", "https://docs.rs")));
        assert!(!same_shallow(&a, &Node::bookmark("rust", "https://rust-lang.org")));
    }

    #[test]
    fn test_same_shallow_ignores_children() {
        let a = Node::folder("Work", vec![Node::bookmark("x", "https://x")]);
        let b = Node::folder("Work", vec![]);
        assert!(same_shallow(&a, &b));
    }

    #[test]
    fn test_same_shallow_kind_mismatch() {
        let folder = Node::folder("Name", vec![]);
        let bookmark = Node::bookmark("Name", "https://example.com");
        assert!(!same_shallow(&folder, &bookmark));
    }

    #[test]
    fn test_separator_placeholders_are_not_meaningful() {
        let chromium = local("9", None, "-----------------", Some("about:blank"));
        let firefox = local("abc", Some(Kind::Separator), "", None);
        assert!(same_shallow(&chromium, &Node::separator()));
        assert!(same_shallow(&firefox, &Node::separator()));
    }

    #[test]
    fn test_from_local_strips_identity_and_placeholders() {
        let mut folder = local("1", None, "Bar", None);
        folder.children = Some(vec![
            local("2", None, "Rust", Some("https://rust-lang.org")),
            local("3", None, "-----------------", Some("about:blank")),
        ]);

        let node = Node::from_local(&folder);
        assert_eq!(
            node,
            Node::folder(
                "Bar",
                vec![
                    Node::bookmark("Rust", "https://rust-lang.org"),
                    Node::separator()
                ]
            )
        );
        assert_eq!(folder.descendant_count(), 2);
    }

    #[test]
    fn test_wire_without_type() {
        let json = r#"[{"title":"Docs","children":[{"title":"Rust","url":"https://rust-lang.org"}]},{"type":"separator"}]"#;
        let nodes: Vec<Node> = serde_json::from_str(json).unwrap();
        assert_eq!(nodes[0].kind(), Kind::Folder);
        assert_eq!(nodes[0].children()[0].kind(), Kind::Bookmark);
        assert_eq!(nodes[1].kind(), Kind::Separator);
    }

    #[test]
    fn test_separator_serializes_without_title_or_url() {
        let json = serde_json::to_string(&Node::separator()).unwrap();
        assert_eq!(json, r#"{"type":"separator"}"#);
    }
}
