//! GitHub implementation of [`RepositoryApi`] over the contents API.

use super::{RepoEntry, RepositoryApi};
use crate::config::RepositoryConfig;
use crate::error::{Result, SourceError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// One item of a `GET /repos/{owner}/{repo}/contents` response
#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    download_url: Option<String>,
}

/// Repository client backed by the GitHub REST API
pub struct GitHubClient {
    /// HTTP client for API and raw content requests
    http_client: reqwest::Client,

    /// API base URL without a trailing slash
    api_base: String,

    /// Bearer token, if configured
    token: Option<String>,
}

impl GitHubClient {
    /// Create a new GitHub client
    ///
    /// # Errors
    /// Returns [`Error::Network`](crate::Error::Network) if the HTTP client cannot be created
    pub fn new(config: &RepositoryConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.http_client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> std::result::Result<reqwest::Response, SourceError> {
        let response = request.send().await.map_err(|e| SourceError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RepositoryApi for GitHubClient {
    async fn list_top_level(
        &self,
        owner: &str,
        repo: &str,
    ) -> std::result::Result<Vec<RepoEntry>, SourceError> {
        let url = format!("{}/repos/{}/{}/contents", self.api_base, owner, repo);
        debug!(url = %url, "Listing repository contents");

        let request = self
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        let response = self.send(request, &url).await?;

        let payload: serde_json::Value =
            response.json().await.map_err(|e| SourceError::UnexpectedPayload {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if !payload.is_array() {
            return Err(SourceError::UnexpectedPayload {
                url,
                reason: "expected a list of entries".to_string(),
            });
        }

        let items: Vec<ContentItem> =
            serde_json::from_value(payload).map_err(|e| SourceError::UnexpectedPayload {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        Ok(items
            .into_iter()
            .map(|item| RepoEntry {
                name: item.name,
                kind: item.kind,
                raw_url: item.download_url,
            })
            .collect())
    }

    async fn fetch_raw(&self, url: &str) -> std::result::Result<Vec<u8>, SourceError> {
        let response = self.send(self.get(url), url).await?;
        let bytes = response.bytes().await.map_err(|e| SourceError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        debug!(url = %url, bytes = bytes.len(), "Fetched raw content");
        Ok(bytes.to_vec())
    }
}
