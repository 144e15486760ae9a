use serde::{Deserialize, Serialize};

use super::snapshot::Timestamp;

/// Persisted sync settings.
///
/// Stored as a flat mapping `{token, remoteId, lastUpdate}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Remote store credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Which remote document to sync with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    /// Timestamp of the last snapshot this device applied or produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<Timestamp>,
}

impl Settings {
    /// The token, treating a blank value as unset.
    pub fn token(&self) -> Option<&str> {
        non_blank(self.token.as_deref())
    }

    /// The remote id, treating a blank value as unset.
    pub fn remote_id(&self) -> Option<&str> {
        non_blank(self.remote_id.as_deref())
    }

    pub fn is_configured(&self) -> bool {
        self.token().is_some() && self.remote_id().is_some()
    }

    /// True if `other` points at a different remote or uses different credentials.
    pub fn target_differs(&self, other: &Settings) -> bool {
        self.token() != other.token() || self.remote_id() != other.remote_id()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_unset() {
        let settings = Settings {
            token: Some("  ".into()),
            remote_id: Some("abc".into()),
            last_update: None,
        };
        assert_eq!(settings.token(), None);
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_json_keys() {
        let settings = Settings {
            token: Some("t".into()),
            remote_id: Some("g".into()),
            last_update: Some(5),
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"token":"t","remoteId":"g","lastUpdate":5}"#);
    }

    #[test]
    fn test_target_differs_ignores_last_update() {
        let a = Settings {
            token: Some("t".into()),
            remote_id: Some("g".into()),
            last_update: Some(1),
        };
        let mut b = a.clone();
        b.last_update = Some(2);
        assert!(!a.target_differs(&b));
        b.remote_id = Some("h".into());
        assert!(a.target_differs(&b));
    }
}
