//! Append-only URL logs, one fixed-name file per failure category.

use crate::error::PersistenceError;
use crate::types::ErrorCategory;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Append one line per URL to the category's log under `error_dir`
pub(crate) async fn append_urls(
    error_dir: &Path,
    category: ErrorCategory,
    urls: &[&str],
) -> Result<(), PersistenceError> {
    if urls.is_empty() {
        return Ok(());
    }

    tokio::fs::create_dir_all(error_dir)
        .await
        .map_err(|e| PersistenceError::CreateDir {
            path: error_dir.to_path_buf(),
            reason: e.to_string(),
        })?;

    let path = error_dir.join(category.log_file_name());
    let write_err = |e: std::io::Error| PersistenceError::Write {
        path: path.clone(),
        reason: e.to_string(),
    };

    let mut buffer = String::new();
    for url in urls {
        buffer.push_str(url);
        buffer.push('\n');
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .map_err(write_err)?;
    file.write_all(buffer.as_bytes()).await.map_err(write_err)?;
    file.flush().await.map_err(write_err)?;
    Ok(())
}
