//! Sequential dispatch over one shared session.

use super::{Dispatcher, open_session, visit_guarded};
use crate::error::Result;
use crate::inspector::PageInspector;
use crate::types::{ScanBatch, TaskOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Visits URLs one at a time through a single session
///
/// A failed or panicking visit never stops the batch; outcomes come back in batch order.
pub struct SequentialExecutor {
    inspector: Arc<dyn PageInspector>,
    visit_timeout: Duration,
}

impl SequentialExecutor {
    /// Create a sequential executor
    pub fn new(inspector: Arc<dyn PageInspector>, visit_timeout: Duration) -> Self {
        Self {
            inspector,
            visit_timeout,
        }
    }
}

#[async_trait]
impl Dispatcher for SequentialExecutor {
    async fn dispatch(&self, batch: &ScanBatch) -> Result<Vec<TaskOutcome>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let session = open_session(self.inspector.as_ref()).await?;
        info!(urls = batch.len(), "Dispatching batch sequentially");

        let mut outcomes = Vec::with_capacity(batch.len());
        for url in batch {
            outcomes.push(visit_guarded(session.as_ref(), url, self.visit_timeout).await);
        }

        session.close().await;
        Ok(outcomes)
    }
}
