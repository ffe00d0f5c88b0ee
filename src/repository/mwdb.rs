//! HTTP client for MWDB-compatible sample repositories.
//!
//! # Endpoints
//!
//! All paths are relative to the configured API root:
//!
//! - `GET file/{id}` - metadata (`file_size`) and tags (`tags[].tag`)
//! - `GET file/{id}/download` - raw content, read chunk by chunk up to the
//!   caller's size limit
//! - `POST file/{id}/comment` - `{"comment": ...}`
//! - `PUT file/{id}/tag` - `{"tag": ...}`
//! - `DELETE file/{id}/tag?tag=...`
//!
//! The client is built once and shared; the underlying connection pool is
//! reused across events.

use crate::core::{ArtifactMetadata, RepositoryError, RepositoryResult, ScanError};
use crate::repository::config::RepositoryConfig;
use crate::repository::traits::{ensure_within_limit, SampleRepository};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Longest response body quoted in an error.
const MAX_ERROR_BODY: usize = 256;

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_size: u64,
    #[serde(default)]
    tags: Vec<TagItem>,
}

#[derive(Debug, Deserialize)]
struct TagItem {
    tag: String,
}

/// MWDB repository client.
///
/// # Example
///
/// ```rust,ignore
/// use scanhook::repository::{MwdbClient, RepositoryConfig};
/// use std::sync::Arc;
///
/// let config = RepositoryConfig::new("https://mwdb.example.org/api/", api_key);
/// let repository = Arc::new(MwdbClient::new(config)?);
/// ```
#[derive(Debug)]
pub struct MwdbClient {
    config: RepositoryConfig,
    base: Url,
    client: reqwest::Client,
}

impl MwdbClient {
    /// Creates a new client.
    ///
    /// Fails with a configuration error if the base URL is unusable or the
    /// HTTP client cannot be built.
    pub fn new(config: RepositoryConfig) -> Result<Self, ScanError> {
        let base = Url::parse(config.base_url.trim()).map_err(|e| {
            ScanError::configuration(format!("invalid repository URL '{}': {}", config.base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(ScanError::configuration(format!(
                "repository URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScanError::configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            base,
            client,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Builds `{base}/file/{id}/{tail...}` with every segment percent-encoded.
    fn endpoint(&self, id: &str, tail: &[&str]) -> RepositoryResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| RepositoryError::Rejected {
                reason: "base URL cannot carry a path".to_string(),
            })?;
            segments.pop_if_empty().push("file").push(id);
            segments.extend(tail);
        }
        Ok(url)
    }

    fn tag_endpoint(&self, id: &str, tag: Option<&str>) -> RepositoryResult<Url> {
        let mut url = self.endpoint(id, &["tag"])?;
        if let Some(tag) = tag {
            url.query_pairs_mut().append_pair("tag", tag);
        }
        Ok(url)
    }

    async fn send(&self, id: &str, request: reqwest::RequestBuilder) -> RepositoryResult<reqwest::Response> {
        let response = request
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| RepositoryError::Unreachable {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(id, status, &body))
    }

    async fn file_info(&self, id: &str) -> RepositoryResult<FileInfo> {
        let url = self.endpoint(id, &[])?;
        let response = self.send(id, self.client.get(url)).await?;
        let body = response.bytes().await.map_err(|e| RepositoryError::Unreachable {
            message: e.to_string(),
        })?;
        parse_file_info(&body)
    }
}

/// Maps a non-success status to a repository error.
fn status_error(id: &str, status: StatusCode, body: &str) -> RepositoryError {
    if status == StatusCode::NOT_FOUND {
        return RepositoryError::NotFound { id: id.to_string() };
    }

    let mut message: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
    if message.is_empty() {
        message = status.canonical_reason().unwrap_or("unknown status").to_string();
    }

    RepositoryError::Http {
        status: status.as_u16(),
        message,
    }
}

fn parse_file_info(body: &[u8]) -> RepositoryResult<FileInfo> {
    serde_json::from_slice(body).map_err(|e| RepositoryError::Decode {
        details: e.to_string(),
    })
}

#[async_trait]
impl SampleRepository for MwdbClient {
    async fn fetch_metadata(&self, id: &str) -> RepositoryResult<ArtifactMetadata> {
        let info = self.file_info(id).await?;
        Ok(ArtifactMetadata::new(id, info.file_size))
    }

    async fn fetch_content(&self, id: &str, max_size: u64) -> RepositoryResult<Vec<u8>> {
        let url = self.endpoint(id, &["download"])?;
        let mut response = self.send(id, self.client.get(url)).await?;
        if let Some(announced) = response.content_length() {
            ensure_within_limit(announced, max_size)?;
        }

        let mut content = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| RepositoryError::Unreachable {
            message: e.to_string(),
        })? {
            ensure_within_limit((content.len() + chunk.len()) as u64, max_size)?;
            content.extend_from_slice(&chunk);
        }
        Ok(content)
    }

    async fn add_comment(&self, id: &str, text: &str) -> RepositoryResult<()> {
        let url = self.endpoint(id, &["comment"])?;
        let request = self
            .client
            .post(url)
            .json(&serde_json::json!({ "comment": text }));
        self.send(id, request).await?;
        Ok(())
    }

    async fn list_tags(&self, id: &str) -> RepositoryResult<BTreeSet<String>> {
        let info = self.file_info(id).await?;
        Ok(info.tags.into_iter().map(|t| t.tag).collect())
    }

    async fn add_tag(&self, id: &str, tag: &str) -> RepositoryResult<()> {
        let url = self.tag_endpoint(id, None)?;
        let request = self.client.put(url).json(&serde_json::json!({ "tag": tag }));
        self.send(id, request).await?;
        Ok(())
    }

    async fn remove_tag(&self, id: &str, tag: &str) -> RepositoryResult<()> {
        let url = self.tag_endpoint(id, Some(tag))?;
        self.send(id, self.client.delete(url)).await?;
        Ok(())
    }
}
