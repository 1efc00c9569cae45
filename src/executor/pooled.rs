//! Pooled dispatch: bounded workers pulling URLs from a shared queue.

use super::{Dispatcher, dispatch_failure, open_sessions, visit_guarded};
use crate::error::Result;
use crate::inspector::{InspectionSession, PageInspector};
use crate::types::{ScanBatch, TaskOutcome};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Visits URLs with up to `max_parallelism` concurrent sessions
///
/// One session is opened per worker before any URL is dispatched. The pool lives for
/// exactly one batch: every worker is joined and every session closed before
/// [`Dispatcher::dispatch`] returns.
pub struct PooledExecutor {
    inspector: Arc<dyn PageInspector>,
    max_parallelism: usize,
    visit_timeout: Duration,
}

impl PooledExecutor {
    /// Create a pooled executor; a parallelism of 0 is treated as 1
    pub fn new(
        inspector: Arc<dyn PageInspector>,
        max_parallelism: usize,
        visit_timeout: Duration,
    ) -> Self {
        Self {
            inspector,
            max_parallelism: max_parallelism.max(1),
            visit_timeout,
        }
    }
}

#[async_trait]
impl Dispatcher for PooledExecutor {
    async fn dispatch(&self, batch: &ScanBatch) -> Result<Vec<TaskOutcome>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let worker_count = self.max_parallelism.min(batch.len());
        let sessions = open_sessions(self.inspector.as_ref(), worker_count).await?;
        info!(urls = batch.len(), workers = worker_count, "Dispatching batch to worker pool");

        let queue = Arc::new(Mutex::new(batch.iter().cloned().collect::<VecDeque<_>>()));
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

        let mut workers = JoinSet::new();
        for (worker_id, session) in sessions.into_iter().enumerate() {
            workers.spawn(run_worker(
                worker_id,
                session,
                Arc::clone(&queue),
                outcome_tx.clone(),
                self.visit_timeout,
            ));
        }
        drop(outcome_tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Inspection worker terminated abnormally");
            }
        }

        let mut outcomes = Vec::with_capacity(batch.len());
        while let Some(outcome) = outcome_rx.recv().await {
            outcomes.push(outcome);
        }
        fill_missing(batch, &mut outcomes);
        Ok(outcomes)
    }
}

async fn run_worker(
    worker_id: usize,
    session: Box<dyn InspectionSession>,
    queue: Arc<Mutex<VecDeque<String>>>,
    outcome_tx: mpsc::UnboundedSender<TaskOutcome>,
    visit_timeout: Duration,
) {
    loop {
        let next = {
            let mut queue_guard = queue.lock().await;
            queue_guard.pop_front()
        };
        let Some(url) = next else {
            break;
        };

        let outcome = visit_guarded(session.as_ref(), &url, visit_timeout).await;
        if outcome_tx.send(outcome).is_err() {
            warn!(worker_id, url = %url, "Outcome receiver closed, stopping worker");
            break;
        }
    }
    session.close().await;
}

/// Give every batch URL without a reported outcome a dispatch failure
fn fill_missing(batch: &ScanBatch, outcomes: &mut Vec<TaskOutcome>) {
    let mut reported: HashMap<String, usize> = HashMap::new();
    for outcome in outcomes.iter() {
        *reported.entry(outcome.url().to_string()).or_default() += 1;
    }

    for url in batch {
        match reported.get_mut(url.as_str()) {
            Some(count) if *count > 0 => *count -= 1,
            _ => {
                warn!(url = %url, "No outcome reported for URL, recording dispatch failure");
                outcomes.push(dispatch_failure(
                    url,
                    "inspection worker terminated before reporting an outcome",
                ));
            }
        }
    }
}
