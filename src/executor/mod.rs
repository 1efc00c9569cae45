//! Task execution engine
//!
//! Split into focused submodules:
//! - `classify` - Error codes and failure categories
//! - `sequential` - One shared session, one URL at a time
//! - `pooled` - Bounded worker pool over a shared queue
//!
//! Both strategies implement [`Dispatcher`] and share [`visit`], so they classify
//! outcomes identically and differ only in scheduling. Neither retries a URL.

mod classify;
mod pooled;
mod sequential;


pub use classify::{
    DISPATCH_FAILED_CODE, TIMEOUT_CODE, UNKNOWN_ERROR_CODE, classify_failure, derive_error_code,
    outcome_category,
};
pub use pooled::PooledExecutor;
pub use sequential::SequentialExecutor;

use crate::config::ConcurrencyMode;
use crate::error::{Error, Result};
use crate::inspector::{InspectionSession, PageInspector};
use crate::types::{ExtractedPageData, ScanBatch, TaskOutcome};
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Dispatch strategy for one batch
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Visit every URL of `batch` and return exactly one outcome per URL
    ///
    /// Outcome order is not guaranteed to match batch order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Setup`] if no inspection session could be opened. Any
    /// sessions opened before the failure are closed first.
    async fn dispatch(&self, batch: &ScanBatch) -> Result<Vec<TaskOutcome>>;
}

/// Build the dispatcher for a concurrency mode
pub fn executor_for(
    mode: ConcurrencyMode,
    inspector: Arc<dyn PageInspector>,
    max_parallelism: usize,
    visit_timeout: Duration,
) -> Box<dyn Dispatcher> {
    match mode {
        ConcurrencyMode::Sequential => Box::new(SequentialExecutor::new(inspector, visit_timeout)),
        ConcurrencyMode::Pooled => Box::new(PooledExecutor::new(
            inspector,
            max_parallelism,
            visit_timeout,
        )),
    }
}

/// Dispatch `batch` with the given concurrency mode
///
/// # Errors
///
/// See [`Dispatcher::dispatch`].
pub async fn run(
    batch: &ScanBatch,
    mode: ConcurrencyMode,
    max_parallelism: usize,
    inspector: Arc<dyn PageInspector>,
    visit_timeout: Duration,
) -> Result<Vec<TaskOutcome>> {
    executor_for(mode, inspector, max_parallelism, visit_timeout)
        .dispatch(batch)
        .await
}

/// Visit one URL and classify the result
///
/// The inspector receives `timeout` and the whole visit is also bounded by it, so a
/// hung inspector yields a [`TIMEOUT_CODE`] failure for this URL only.
pub async fn visit(session: &dyn InspectionSession, url: &str, timeout: Duration) -> TaskOutcome {
    let outcome = match tokio::time::timeout(timeout, session.inspect(url, timeout)).await {
        Ok(Ok(report)) if report.has_signal() => {
            let scan_date = chrono::Local::now().date_naive();
            TaskOutcome::Success(ExtractedPageData::from_report(url, scan_date, report))
        }
        Ok(Ok(_)) => TaskOutcome::NoSignal {
            url: url.to_string(),
        },
        Ok(Err(e)) => {
            let message = e.to_string();
            TaskOutcome::Failure {
                url: url.to_string(),
                error_code: derive_error_code(&message),
                message,
            }
        }
        Err(_) => TaskOutcome::Failure {
            url: url.to_string(),
            error_code: TIMEOUT_CODE.to_string(),
            message: format!("visit timed out after {}ms", timeout.as_millis()),
        },
    };

    match &outcome {
        TaskOutcome::Failure { error_code, .. } => {
            debug!(url, error_code = %error_code, "Visit failed");
        }
        other => debug!(url, success = other.is_success(), "Visit finished"),
    }
    outcome
}

/// Visit one URL, recording a panic inside the inspector as a dispatch failure
async fn visit_guarded(
    session: &dyn InspectionSession,
    url: &str,
    timeout: Duration,
) -> TaskOutcome {
    match AssertUnwindSafe(visit(session, url, timeout)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(url, "Inspector panicked during visit");
            dispatch_failure(url, "inspector panicked during visit")
        }
    }
}

/// Failure outcome for a URL the engine could not get a result for
fn dispatch_failure(url: &str, message: &str) -> TaskOutcome {
    TaskOutcome::Failure {
        url: url.to_string(),
        error_code: DISPATCH_FAILED_CODE.to_string(),
        message: message.to_string(),
    }
}

/// Open one session, normalising any failure to [`Error::Setup`]
async fn open_session(inspector: &dyn PageInspector) -> Result<Box<dyn InspectionSession>> {
    inspector.open_session().await.map_err(|e| match e {
        Error::Setup(_) => e,
        other => Error::Setup(format!("{} inspector: {}", inspector.name(), other)),
    })
}

/// Open `count` sessions, closing the opened ones if any open fails
async fn open_sessions(
    inspector: &dyn PageInspector,
    count: usize,
) -> Result<Vec<Box<dyn InspectionSession>>> {
    let mut sessions = Vec::with_capacity(count);
    for _ in 0..count {
        match open_session(inspector).await {
            Ok(session) => sessions.push(session),
            Err(e) => {
                futures::future::join_all(sessions.iter().map(|session| session.close())).await;
                return Err(e);
            }
        }
    }
    Ok(sessions)
}
