//! GitHub Gist remote store.
//!
//! The snapshot lives in a single gist file, [`SNAPSHOT_FILE`], as
//! pretty-printed JSON. The gist itself must already exist; its id is the
//! remote id and a personal access token with the `gist` scope is the
//! credential.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::remote::{RemoteDocument, RemoteError, RemoteStore, RemoteTarget};
use crate::models::Snapshot;

/// Default GitHub API endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";
/// Gist file holding the snapshot.
pub const SNAPSHOT_FILE: &str = "bookmark.json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("marksync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    files: HashMap<String, Option<GistFile>>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    content: Option<String>,
}

/// Remote store backed by a GitHub gist.
#[derive(Debug, Clone)]
pub struct GistStore {
    client: reqwest::Client,
    api_url: String,
}

impl GistStore {
    pub fn new(api_url: impl Into<String>) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RemoteError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    /// Store talking to api.github.com.
    pub fn github() -> Result<Self, RemoteError> {
        Self::new(GITHUB_API_URL)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub(crate) fn gist_url(&self, gist_id: &str) -> String {
        format!("{}/gists/{}", self.api_url.trim_end_matches('/'), gist_id)
    }
}

/// Maps an HTTP status to the remote error taxonomy.
fn check_status(status: StatusCode, gist_id: &str) -> Result<(), RemoteError> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RemoteError::Unauthorized),
        StatusCode::NOT_FOUND => Err(RemoteError::NotFound(gist_id.to_string())),
        other => Err(RemoteError::Status(other.as_u16())),
    }
}

/// Extracts the snapshot from a gist API response body.
pub(crate) fn parse_gist(body: &str) -> Result<RemoteDocument, RemoteError> {
    let gist: GistResponse =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
    if gist.truncated {
        return Ok(RemoteDocument::truncated());
    }

    let Some(file) = gist.files.get(SNAPSHOT_FILE).and_then(Option::as_ref) else {
        return Ok(RemoteDocument::default());
    };
    if file.truncated {
        return Ok(RemoteDocument::truncated());
    }

    match file.content.as_deref() {
        Some(content) => {
            let snapshot =
                Snapshot::from_json(content).map_err(|e| RemoteError::Decode(e.to_string()))?;
            Ok(RemoteDocument::with_snapshot(snapshot))
        }
        None => Ok(RemoteDocument::default()),
    }
}

/// Request body replacing the snapshot file.
pub(crate) fn patch_body(snapshot: &Snapshot) -> Result<serde_json::Value, RemoteError> {
    let content = snapshot
        .to_json_pretty()
        .map_err(|e| RemoteError::Decode(e.to_string()))?;
    Ok(serde_json::json!({
        "files": {
            SNAPSHOT_FILE: { "content": content }
        }
    }))
}

#[async_trait]
impl RemoteStore for GistStore {
    async fn fetch(&self, target: &RemoteTarget) -> Result<RemoteDocument, RemoteError> {
        let url = self.gist_url(&target.remote_id);
        tracing::debug!("Fetching gist {}", target.remote_id);

        let response = self
            .client
            .get(&url)
            .header("Accept", ACCEPT)
            .header("Authorization", format!("token {}", target.token))
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        check_status(response.status(), &target.remote_id)?;

        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;
        parse_gist(&body)
    }

    async fn replace(&self, target: &RemoteTarget, snapshot: &Snapshot) -> Result<(), RemoteError> {
        let url = self.gist_url(&target.remote_id);
        let body = patch_body(snapshot)?;
        tracing::debug!("Updating gist {}", target.remote_id);

        let response = self
            .client
            .patch(&url)
            .header("Accept", ACCEPT)
            .header("Authorization", format!("token {}", target.token))
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        check_status(response.status(), &target.remote_id)
    }
}
