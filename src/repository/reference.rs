//! Parsing of repository references into repository roots or direct file links.

use crate::error::SourceError;
use crate::extractor::is_supported_source;

const GITHUB_HOSTS: &[&str] = &["github.com", "www.github.com"];
const RAW_HOST: &str = "raw.githubusercontent.com";

/// What a repository reference points at
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RepositoryReference {
    /// The top level of a repository
    Root {
        /// Repository owner (user or organisation)
        owner: String,
        /// Repository name
        repo: String,
    },
    /// One file inside a repository, fetched directly
    File {
        /// URL serving the file's raw bytes
        raw_url: String,
        /// File name, used to pick the extraction format
        name: String,
    },
}

impl std::str::FromStr for RepositoryReference {
    type Err = SourceError;

    /// Accepted shapes:
    /// - `owner/repo` and `github.com/owner/repo`
    /// - `https://github.com/owner/repo` (optionally `/tree/<ref>...` or `.git`)
    /// - `https://github.com/owner/repo/blob/<ref>/<path>` (rewritten to the raw host)
    /// - `https://raw.githubusercontent.com/owner/repo/<ref>/<path>`
    /// - any other http(s) URL whose last path segment has a supported extension
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(SourceError::InvalidReference("empty reference".to_string()));
        }

        if !trimmed.contains("://") {
            if trimmed.starts_with("github.com/") || trimmed.starts_with("www.github.com/") {
                return format!("https://{trimmed}").parse();
            }
            return parse_owner_repo(trimmed, s);
        }

        let url = url::Url::parse(trimmed)
            .map_err(|e| SourceError::InvalidReference(format!("{s}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SourceError::InvalidReference(format!(
                "{s}: unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        if GITHUB_HOSTS.contains(&host.as_str()) {
            return parse_github_url(&segments, s);
        }

        if host == RAW_HOST {
            if segments.len() < 4 {
                return Err(SourceError::InvalidReference(format!(
                    "{s}: raw link must name owner, repository, ref and path"
                )));
            }
            return file_reference(trimmed.to_string(), &segments, s);
        }

        match segments.last() {
            Some(last) if is_supported_source(last) => {
                file_reference(trimmed.to_string(), &segments, s)
            }
            _ => Err(SourceError::InvalidReference(format!(
                "{s}: not a repository or a supported file link"
            ))),
        }
    }
}

fn parse_owner_repo(candidate: &str, original: &str) -> Result<RepositoryReference, SourceError> {
    let parts: Vec<&str> = candidate.split('/').collect();
    match parts.as_slice() {
        [owner, repo] if is_name(owner) && is_name(repo) => Ok(RepositoryReference::Root {
            owner: owner.to_string(),
            repo: repo.trim_end_matches(".git").to_string(),
        }),
        _ => Err(SourceError::InvalidReference(format!(
            "{original}: expected 'owner/repo'"
        ))),
    }
}

fn parse_github_url(segments: &[&str], original: &str) -> Result<RepositoryReference, SourceError> {
    match segments {
        [owner, repo] | [owner, repo, "tree", ..] if is_name(owner) && is_name(repo) => {
            Ok(RepositoryReference::Root {
                owner: owner.to_string(),
                repo: repo.trim_end_matches(".git").to_string(),
            })
        }
        [owner, repo, "blob", rest @ ..] if rest.len() >= 2 => {
            let raw_url = format!(
                "https://{RAW_HOST}/{owner}/{repo}/{}",
                rest.join("/")
            );
            file_reference(raw_url, segments, original)
        }
        _ => Err(SourceError::InvalidReference(format!(
            "{original}: not a repository root or file link"
        ))),
    }
}

fn file_reference(
    raw_url: String,
    segments: &[&str],
    original: &str,
) -> Result<RepositoryReference, SourceError> {
    let name = segments
        .last()
        .map(|seg| seg.to_string())
        .ok_or_else(|| SourceError::InvalidReference(format!("{original}: missing file name")))?;
    Ok(RepositoryReference::File { raw_url, name })
}

fn is_name(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
