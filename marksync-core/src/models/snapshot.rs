//! Snapshot documents shared through the remote store.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::node::Node;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Current wall-clock time as a [`Timestamp`].
pub fn now() -> Timestamp {
    Utc::now().timestamp_millis()
}

/// The built-in top-level bookmark folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Toolbar,
    Other,
    Mobile,
    Menu,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Toolbar,
        Category::Other,
        Category::Mobile,
        Category::Menu,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Category::Toolbar => "toolbar",
            Category::Other => "other",
            Category::Mobile => "mobile",
            Category::Menu => "menu",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Unknown category '{}'. Valid categories: toolbar, other, mobile, menu",
                    s
                )
            })
    }
}

/// The bookmark state of one device at a point in time.
///
/// Serialized as `{"lastUpdate": <ms>, "toolbar": [...], "other": [...], ...}`.
/// Categories the producing platform does not have are simply absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    toolbar: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    other: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mobile: Option<Vec<Node>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    menu: Option<Vec<Node>>,
}

impl Snapshot {
    pub fn new(last_update: Timestamp) -> Self {
        Self {
            last_update: Some(last_update),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: Category, nodes: Vec<Node>) -> Self {
        *self.slot(category) = Some(nodes);
        self
    }

    /// Nodes of a category, or `None` when the snapshot does not carry it.
    pub fn category(&self, category: Category) -> Option<&[Node]> {
        match category {
            Category::Toolbar => self.toolbar.as_deref(),
            Category::Other => self.other.as_deref(),
            Category::Mobile => self.mobile.as_deref(),
            Category::Menu => self.menu.as_deref(),
        }
    }

    /// Categories present in this snapshot, in canonical order.
    pub fn categories(&self) -> impl Iterator<Item = (Category, &[Node])> {
        Category::ALL
            .into_iter()
            .filter_map(|c| self.category(c).map(|nodes| (c, nodes)))
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    fn slot(&mut self, category: Category) -> &mut Option<Vec<Node>> {
        match category {
            Category::Toolbar => &mut self.toolbar,
            Category::Other => &mut self.other,
            Category::Mobile => &mut self.mobile,
            Category::Menu => &mut self.menu,
        }
    }
}
