//! Repository sourcing: resolve a repository reference into candidate URLs.
//!
//! Split into focused submodules:
//! - [`reference`] - Parsing repository roots vs. direct file links
//! - [`github`] - GitHub contents API client
//!
//! [`fetch_repository_urls`] never fails: unreachable listings, malformed references
//! and non-list payloads are logged and yield an empty result, and individual file
//! fetch failures are logged and skipped.

mod github;
mod reference;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use github::GitHubClient;
pub use reference::RepositoryReference;

use crate::error::SourceError;
use crate::extractor::{UrlSet, extract_urls, is_supported_source};
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

/// One top-level entry of a repository listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoEntry {
    /// Entry name (file or directory name)
    pub name: String,
    /// Entry type as reported by the API (`file`, `dir`, ...)
    pub kind: String,
    /// URL serving the raw bytes (None for directories)
    pub raw_url: Option<String>,
}

impl RepoEntry {
    /// True if this entry is a file
    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }
}

/// Read access to a hosted repository
///
/// Both operations fail with a [`SourceError`] on non-success HTTP status, transport
/// failure, or an unexpected payload.
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    /// List the top-level entries of `owner/repo`
    async fn list_top_level(
        &self,
        owner: &str,
        repo: &str,
    ) -> std::result::Result<Vec<RepoEntry>, SourceError>;

    /// Fetch the raw bytes behind `url`
    async fn fetch_raw(&self, url: &str) -> std::result::Result<Vec<u8>, SourceError>;
}

/// Resolve a repository reference into a list of unique URLs
///
/// A direct file link is fetched once and extracted. A repository root is listed,
/// and every top-level file with a supported extension is fetched and extracted in
/// listing order until `max_count` unique URLs have been collected.
///
/// The result preserves first-seen order and holds at most `max_count` URLs.
pub async fn fetch_repository_urls(
    api: &dyn RepositoryApi,
    reference: &str,
    max_count: Option<usize>,
) -> Vec<String> {
    let reference = match reference.parse::<RepositoryReference>() {
        Ok(reference) => reference,
        Err(e) => {
            error!(reference, error = %e, "Cannot resolve repository reference");
            return Vec::new();
        }
    };

    let mut urls = match reference {
        RepositoryReference::File { raw_url, name } => match api.fetch_raw(&raw_url).await {
            Ok(bytes) => extract_urls(&name, &bytes),
            Err(e) => {
                error!(url = %raw_url, error = %e, "Failed to fetch repository file");
                return Vec::new();
            }
        },
        RepositoryReference::Root { owner, repo } => {
            let entries = match api.list_top_level(&owner, &repo).await {
                Ok(entries) => entries,
                Err(e) => {
                    error!(owner = %owner, repo = %repo, error = %e, "Failed to list repository");
                    return Vec::new();
                }
            };
            collect_from_entries(api, &entries, max_count).await
        }
    };

    if let Some(max) = max_count {
        urls.truncate(max);
    }
    info!(count = urls.len(), "Collected URLs from repository");
    urls
}

async fn collect_from_entries(
    api: &dyn RepositoryApi,
    entries: &[RepoEntry],
    max_count: Option<usize>,
) -> Vec<String> {
    let mut urls = UrlSet::new();

    for entry in entries
        .iter()
        .filter(|entry| entry.is_file() && is_supported_source(&entry.name))
    {
        if max_count.is_some_and(|max| urls.len() >= max) {
            debug!(limit = ?max_count, "URL limit reached, skipping remaining files");
            break;
        }

        let Some(raw_url) = entry.raw_url.as_deref() else {
            warn!(name = %entry.name, "Listing entry has no raw content URL, skipping");
            continue;
        };

        match api.fetch_raw(raw_url).await {
            Ok(bytes) => {
                let before = urls.len();
                urls.extend(extract_urls(&entry.name, &bytes));
                debug!(
                    name = %entry.name,
                    added = urls.len() - before,
                    "Extracted repository file"
                );
            }
            Err(e) => {
                warn!(name = %entry.name, error = %e, "Failed to fetch repository file, skipping");
            }
        }
    }

    urls.into_vec()
}
