//! Outcome persistence
//!
//! Split into focused submodules:
//! - `record_store` - Dated JSON record files, merged on every write
//! - `error_log` - Append-only per-category URL logs
//! - `reconcile` - Removing processed URLs from a line-delimited input file
//!
//! Persistence never fails the run. Every write error is logged and the chunk's
//! successes are still returned to the caller.

mod error_log;
mod reconcile;
mod record_store;


pub use record_store::record_path;

use crate::executor::outcome_category;
use crate::extractor::SourceFormat;
use crate::types::{ErrorCategory, ExtractedPageData, TaskOutcome, UrlSource};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, error, info};

/// Categories in the order their logs are written
const LOG_CATEGORIES: [ErrorCategory; 3] = [
    ErrorCategory::NoSignal,
    ErrorCategory::NavigationError,
    ErrorCategory::ProcessingError,
];

/// Persist one chunk's outcomes and return its successful extractions
///
/// - successes are merged into today's record file under `output_dir`
/// - no-signal pages and failures are appended to their category log under `error_dir`
/// - a line-delimited local source file loses the lines that succeeded, provided
///   they belong to `scope_urls`
pub async fn persist(
    outcomes: &[TaskOutcome],
    output_dir: &Path,
    error_dir: &Path,
    scope_urls: &[String],
    source: &UrlSource,
) -> Vec<ExtractedPageData> {
    let today = chrono::Local::now().date_naive();
    persist_on(today, outcomes, output_dir, error_dir, scope_urls, source).await
}

/// [`persist`] with an explicit calendar date for the record file
pub(crate) async fn persist_on(
    date: NaiveDate,
    outcomes: &[TaskOutcome],
    output_dir: &Path,
    error_dir: &Path,
    scope_urls: &[String],
    source: &UrlSource,
) -> Vec<ExtractedPageData> {
    let mut successes = Vec::new();
    let mut logged: [Vec<&str>; 3] = Default::default();

    for outcome in outcomes {
        match outcome {
            TaskOutcome::Success(data) => successes.push(data.clone()),
            other => {
                if let Some(category) = outcome_category(other)
                    && let Some(slot) = LOG_CATEGORIES.iter().position(|c| *c == category)
                {
                    logged[slot].push(other.url());
                }
            }
        }
    }

    if successes.is_empty() {
        debug!("No successes in chunk, record store untouched");
    } else if let Err(e) = record_store::write_records(output_dir, date, &successes).await {
        error!(error = %e, records = successes.len(), "Failed to write record store");
    }

    for (category, urls) in LOG_CATEGORIES.iter().zip(&logged) {
        if let Err(e) = error_log::append_urls(error_dir, *category, urls).await {
            error!(category = %category, error = %e, "Failed to append to error log");
        }
    }

    if let UrlSource::LocalFile(path) = source
        && is_line_delimited(path)
    {
        let succeeded: HashSet<&str> = successes.iter().map(|data| data.url.as_str()).collect();
        match reconcile::reconcile_source(path, scope_urls, &succeeded).await {
            Ok(remaining) => {
                info!(path = %path.display(), remaining, "Reconciled source file");
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to reconcile source file");
            }
        }
    }

    successes
}

fn is_line_delimited(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| SourceFormat::from_name(name).is_line_delimited())
}
