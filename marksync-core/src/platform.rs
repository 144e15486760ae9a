//! Platform profiles: which categories exist and how nodes are stored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{Category, Kind};

/// Title a platform without real separators stores for one.
pub const SEPARATOR_PLACEHOLDER_TITLE: &str = "-----------------";
/// Url a platform without real separators stores for one.
pub const SEPARATOR_PLACEHOLDER_URL: &str = "about:blank";

/// The bookmark storage conventions of a host browser family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Stores kind tags and has all four categories.
    #[default]
    Firefox,
    /// No kind tags, no separators, no mobile or menu folders.
    Chromium,
}

/// Fields a platform actually stores for a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFields {
    pub kind: Option<Kind>,
    pub title: String,
    pub url: Option<String>,
}

impl Platform {
    pub fn categories(&self) -> &'static [Category] {
        match self {
            Platform::Firefox => &Category::ALL,
            Platform::Chromium => &[Category::Toolbar, Category::Other],
        }
    }

    /// Built-in id of a category's root folder.
    pub fn root_id(&self, category: Category) -> Option<&'static str> {
        match (self, category) {
            (Platform::Firefox, Category::Toolbar) => Some("toolbar_____"),
            (Platform::Firefox, Category::Other) => Some("unfiled_____"),
            (Platform::Firefox, Category::Mobile) => Some("mobile______"),
            (Platform::Firefox, Category::Menu) => Some("menu________"),
            (Platform::Chromium, Category::Toolbar) => Some("1"),
            (Platform::Chromium, Category::Other) => Some("2"),
            (Platform::Chromium, _) => None,
        }
    }

    /// Lowers a node of `kind` to the fields this platform stores.
    pub fn lower(&self, kind: Kind, title: Option<&str>, url: Option<&str>) -> StoredFields {
        let title = title.unwrap_or_default().to_string();
        match (self, kind) {
            (Platform::Firefox, Kind::Separator) => StoredFields {
                kind: Some(Kind::Separator),
                title: String::new(),
                url: None,
            },
            (Platform::Firefox, Kind::Folder) => StoredFields {
                kind: Some(Kind::Folder),
                title,
                url: None,
            },
            (Platform::Firefox, Kind::Bookmark) => StoredFields {
                kind: Some(Kind::Bookmark),
                title,
                url: url.map(str::to_string),
            },
            (Platform::Chromium, Kind::Separator) => StoredFields {
                kind: None,
                title: SEPARATOR_PLACEHOLDER_TITLE.to_string(),
                url: Some(SEPARATOR_PLACEHOLDER_URL.to_string()),
            },
            (Platform::Chromium, Kind::Folder) => StoredFields {
                kind: None,
                title,
                url: None,
            },
            (Platform::Chromium, Kind::Bookmark) => StoredFields {
                kind: None,
                title,
                url: url.map(str::to_string),
            },
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Firefox => write!(f, "firefox"),
            Platform::Chromium => write!(f, "chromium"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(Platform::Firefox),
            "chromium" | "chrome" => Ok(Platform::Chromium),
            _ => Err(format!(
                "Unknown platform '{}'. Valid platforms: firefox, chromium",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chromium_has_two_categories() {
        assert_eq!(
            Platform::Chromium.categories(),
            &[Category::Toolbar, Category::Other]
        );
        assert_eq!(Platform::Chromium.root_id(Category::Menu), None);
        assert_eq!(Platform::Firefox.root_id(Category::Other), Some("unfiled_____"));
    }

    #[test]
    fn test_chromium_separator_placeholder() {
        let stored = Platform::Chromium.lower(Kind::Separator, Some("ignored"), None);
        assert_eq!(stored.kind, None);
        assert_eq!(stored.title, SEPARATOR_PLACEHOLDER_TITLE);
        assert_eq!(stored.url.as_deref(), Some(SEPARATOR_PLACEHOLDER_URL));
    }

    #[test]
    fn test_firefox_strips_separator_fields() {
        let stored = Platform::Firefox.lower(Kind::Separator, Some("x"), Some("https://x"));
        assert_eq!(stored.kind, Some(Kind::Separator));
        assert!(stored.title.is_empty());
        assert_eq!(stored.url, None);
    }

    #[test]
    fn test_folder_never_stores_url() {
        for platform in [Platform::Firefox, Platform::Chromium] {
            let stored = platform.lower(Kind::Folder, Some("Work"), Some("https://x"));
            assert_eq!(stored.url, None);
            assert_eq!(stored.title, "Work");
        }
    }

    #[test]
    fn test_parse_platform() {
        assert_eq!("Chrome".parse::<Platform>().unwrap(), Platform::Chromium);
        assert_eq!("firefox".parse::<Platform>().unwrap(), Platform::Firefox);
        assert!("safari".parse::<Platform>().is_err());
    }
}
