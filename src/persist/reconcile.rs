//! Removes processed URLs from a line-delimited input file.

use crate::error::PersistenceError;
use crate::extractor::line_urls;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Rewrite `path` without the lines that succeeded this round
///
/// A line is dropped only if it yields at least one URL and every URL it yields is
/// both in `scope` and in `succeeded`. Every other non-blank line is kept, trimmed,
/// in its original order.
/// A missing file is recreated from `scope` minus `succeeded`. Returns the number
/// of lines written.
pub(crate) async fn reconcile_source(
    path: &Path,
    scope: &[String],
    succeeded: &HashSet<&str>,
) -> Result<usize, PersistenceError> {
    let scope_set: HashSet<&str> = scope.iter().map(String::as_str).collect();

    let remaining: Vec<String> = match tokio::fs::read(path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !is_processed(line, &scope_set, succeeded))
            .map(str::to_string)
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Source file missing, recreating from scope");
            scope
                .iter()
                .filter(|url| !succeeded.contains(url.as_str()))
                .cloned()
                .collect()
        }
        Err(e) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    let mut body = remaining.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    tokio::fs::write(path, body)
        .await
        .map_err(|e| PersistenceError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    Ok(remaining.len())
}

fn is_processed(line: &str, scope: &HashSet<&str>, succeeded: &HashSet<&str>) -> bool {
    let urls = line_urls(line);
    !urls.is_empty()
        && urls
            .iter()
            .all(|url| scope.contains(url.as_str()) && succeeded.contains(url.as_str()))
}
