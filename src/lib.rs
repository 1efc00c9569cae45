//! # adscan
//!
//! Resumable scanner that detects third-party ad-technology integrations across
//! large URL sets.
//!
//! ## Pipeline
//!
//! A run moves through five stages:
//! 1. **Sourcing** - read URLs from a local file or a hosted repository
//!    ([`extractor`], [`repository`])
//! 2. **Partitioning** - select a 1-based range and split it into chunks ([`partition`])
//! 3. **Dispatch** - visit every URL of a chunk through a page inspector, sequentially
//!    or with a bounded worker pool ([`executor`], [`inspector`])
//! 4. **Persistence** - merge successes into a dated record file, append failures to
//!    per-category logs, and drop processed lines from the input file ([`persist`])
//! 5. **Summary** - counts for the whole run ([`RunSummary`])
//!
//! Each chunk is persisted before the next one is dispatched, so an interrupted run
//! can be resumed from the reconciled input file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use adscan::{ScanConfig, Scanner};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = ScanConfig::default();
//!     config.source.file = Some(PathBuf::from("urls.txt"));
//!     config.execution.chunk_size = Some(100);
//!
//!     let scanner = Scanner::from_config(config)?;
//!     let summary = scanner.run().await?;
//!     println!("{} pages with ad integrations", summary.succeeded);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Task execution engine (sequential and pooled dispatch)
pub mod executor;
/// URL extraction from raw source content
pub mod extractor;
/// Page inspector boundary
pub mod inspector;
/// Range selection and chunking
pub mod partition;
/// Outcome persistence
pub mod persist;
/// Repository sourcing
pub mod repository;
/// Pipeline orchestration
pub mod scanner;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{ConcurrencyMode, ScanConfig};
pub use error::{Error, PersistenceError, Result, SourceError};
pub use executor::{Dispatcher, PooledExecutor, SequentialExecutor};
pub use inspector::{CommandInspector, InspectionSession, PageInspector};
pub use repository::{GitHubClient, RepositoryApi};
pub use scanner::{ScanProgress, Scanner};
pub use types::{
    ErrorCategory, ExtractedPageData, InspectionReport, IntegrationInstance, RunSummary,
    ScanBatch, TaskOutcome, UrlSource,
};

/// Run a scan until it finishes or a termination signal arrives.
///
/// Returns `Ok(None)` if the run was interrupted. Chunks persisted before the
/// signal stay persisted, and a line-delimited input file only lists the URLs
/// that still need a successful visit.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use adscan::{ScanConfig, Scanner, run_until_signal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let scanner = Scanner::from_config(ScanConfig::default())?;
///
///     if let Some(summary) = run_until_signal(&scanner).await? {
///         println!("{summary:?}");
///     }
///
///     Ok(())
/// }
/// ```
pub async fn run_until_signal(scanner: &Scanner) -> Result<Option<RunSummary>> {
    tokio::select! {
        result = scanner.run() => result.map(Some),
        _ = wait_for_signal() => {
            tracing::warn!("Scan interrupted, stopping after persisted chunks");
            Ok(None)
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(
                error = %e,
                "Could not register SIGTERM handler, waiting for SIGINT only"
            );
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(
                error = %e,
                "Could not register SIGINT handler, waiting for SIGTERM only"
            );
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(
                error = %e,
                "Could not register any signal handlers, using ctrl_c fallback"
            );
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
