//! Dated record store holding one JSON array of page records per calendar day.

use crate::error::PersistenceError;
use crate::types::ExtractedPageData;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Record file for `date` under `output_dir`: `<Mon-YYYY>/<YYYY-MM-DD>.json`
///
/// ```
/// use adscan::persist::record_path;
/// use chrono::NaiveDate;
/// use std::path::Path;
///
/// let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
/// assert_eq!(
///     record_path(Path::new("out"), date),
///     Path::new("out/Oct-2026/2026-10-18.json")
/// );
/// ```
pub fn record_path(output_dir: &Path, date: NaiveDate) -> PathBuf {
    output_dir
        .join(date.format("%b-%Y").to_string())
        .join(format!("{}.json", date.format("%Y-%m-%d")))
}

/// Merge `records` into the day's record file and rewrite it
///
/// Existing content that parses as a JSON array is kept ahead of the new records.
/// Anything else is discarded with a warning. Returns the file path.
pub(crate) async fn write_records(
    output_dir: &Path,
    date: NaiveDate,
    records: &[ExtractedPageData],
) -> Result<PathBuf, PersistenceError> {
    let path = record_path(output_dir, date);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PersistenceError::CreateDir {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
    }

    let mut merged = load_existing(&path).await;
    let existing = merged.len();
    for record in records {
        let value = serde_json::to_value(record).map_err(|e| PersistenceError::Encode {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        merged.push(value);
    }

    let body = serde_json::to_vec_pretty(&merged).map_err(|e| PersistenceError::Encode {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    tokio::fs::write(&path, body)
        .await
        .map_err(|e| PersistenceError::Write {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    info!(
        path = %path.display(),
        existing,
        added = records.len(),
        "Wrote record store"
    );
    Ok(path)
}

/// Records already in the file, or nothing if it is missing or unusable
async fn load_existing(path: &Path) -> Vec<serde_json::Value> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Record store unreadable, overwriting");
            return Vec::new();
        }
    };

    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(serde_json::Value::Array(records)) => records,
        Ok(_) => {
            warn!(path = %path.display(), "Record store is not a list, overwriting");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Record store is corrupt, overwriting");
            Vec::new()
        }
    }
}
