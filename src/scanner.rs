//! Scan pipeline orchestration
//!
//! A run resolves its URL source, applies the configured range, splits the result
//! into chunks, and for every chunk dispatches the URLs and persists the outcomes
//! before moving on. Progress is carried from chunk to chunk as an owned
//! [`ScanProgress`] value.

use crate::config::ScanConfig;
use crate::error::{Error, Result, SourceError};
use crate::executor::{Dispatcher, executor_for, outcome_category};
use crate::extractor::extract_urls;
use crate::inspector::{CommandInspector, PageInspector};
use crate::partition::{apply_range, chunk};
use crate::persist::persist;
use crate::repository::{GitHubClient, RepositoryApi, fetch_repository_urls};
use crate::types::{
    ErrorCategory, ExtractedPageData, RunSummary, ScanBatch, TaskOutcome, UrlSource,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Accumulated state of a run, passed into and returned from each chunk step
#[derive(Clone, Debug, Default)]
pub struct ScanProgress {
    /// URLs that received an outcome, in the order outcomes were recorded
    pub processed_urls: Vec<String>,
    /// Successful extractions returned by the persister
    pub successes: Vec<ExtractedPageData>,
    /// Running counts
    pub summary: RunSummary,
}

impl ScanProgress {
    /// Fresh progress for a run over `urls_in_scope` URLs
    pub fn new(urls_in_scope: usize) -> Self {
        Self {
            summary: RunSummary {
                urls_in_scope,
                ..RunSummary::default()
            },
            ..Self::default()
        }
    }

    /// Fold one chunk's outcomes and persisted records into the progress
    pub fn record(mut self, outcomes: &[TaskOutcome], persisted: Vec<ExtractedPageData>) -> Self {
        for outcome in outcomes {
            self.processed_urls.push(outcome.url().to_string());
            match outcome_category(outcome) {
                None => self.summary.succeeded += 1,
                Some(ErrorCategory::NoSignal) => self.summary.no_signal += 1,
                Some(ErrorCategory::NavigationError) => self.summary.navigation_errors += 1,
                Some(ErrorCategory::ProcessingError) => self.summary.processing_errors += 1,
            }
        }
        self.summary.records_written += persisted.len();
        self.summary.chunks_processed += 1;
        self.successes.extend(persisted);
        self
    }

    /// Final counts
    pub fn into_summary(self) -> RunSummary {
        self.summary
    }
}

/// Runs the scan pipeline for one configuration
pub struct Scanner {
    config: ScanConfig,
    inspector: Arc<dyn PageInspector>,
    repository: Arc<dyn RepositoryApi>,
}

impl Scanner {
    /// Create a scanner with explicit collaborators
    pub fn new(
        config: ScanConfig,
        inspector: Arc<dyn PageInspector>,
        repository: Arc<dyn RepositoryApi>,
    ) -> Self {
        Self {
            config,
            inspector,
            repository,
        }
    }

    /// Create a scanner with the command inspector and the GitHub client
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid, or
    /// [`Error::Network`] if the HTTP client cannot be built. A missing inspector
    /// program is only reported when the first chunk is dispatched.
    pub fn from_config(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let inspector = CommandInspector::from_config(&config.inspector);
        let repository = GitHubClient::new(&config.repository)?;
        Ok(Self::new(config, Arc::new(inspector), Arc::new(repository)))
    }

    /// The configuration this scanner runs with
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run the whole pipeline
    ///
    /// A missing source or an empty URL set is logged and yields an empty summary.
    /// Individual visit, source and persistence problems never abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Setup`] if a chunk's inspection sessions cannot be opened.
    /// Chunks persisted before the failure stay persisted.
    pub async fn run(&self) -> Result<RunSummary> {
        let Some(source) = self.config.source.url_source() else {
            let e = Error::config("no URL source configured", "source");
            error!(error = %e, "Nothing to scan");
            return Ok(RunSummary::default());
        };

        let urls = self.load_urls(&source).await;
        let scope = apply_range(urls, self.config.execution.range.as_deref());
        if scope.is_empty() {
            let e = Error::config("resolved URL set is empty", "source");
            error!(error = %e, source = ?source, "Nothing to scan");
            return Ok(RunSummary::default());
        }

        let execution = &self.config.execution;
        let batches = chunk(&scope, execution.chunk_size);
        let dispatcher = executor_for(
            execution.mode,
            Arc::clone(&self.inspector),
            execution.max_parallelism,
            execution.visit_timeout(),
        );
        info!(
            urls = scope.len(),
            chunks = batches.len(),
            mode = ?execution.mode,
            "Starting scan"
        );

        let mut progress = ScanProgress::new(scope.len());
        let total = batches.len();
        for (index, batch) in batches.iter().enumerate() {
            info!(chunk = index + 1, total, urls = batch.len(), "Processing chunk");
            progress = self
                .process_chunk(progress, dispatcher.as_ref(), &source, &scope, batch)
                .await?;
        }

        let summary = progress.into_summary();
        info!(
            succeeded = summary.succeeded,
            no_signal = summary.no_signal,
            navigation_errors = summary.navigation_errors,
            processing_errors = summary.processing_errors,
            "Scan finished"
        );
        Ok(summary)
    }

    /// Dispatch one chunk, persist its outcomes and fold them into `progress`
    async fn process_chunk(
        &self,
        progress: ScanProgress,
        dispatcher: &dyn Dispatcher,
        source: &UrlSource,
        scope: &[String],
        batch: &ScanBatch,
    ) -> Result<ScanProgress> {
        let outcomes = dispatcher.dispatch(batch).await?;
        if outcomes.len() != batch.len() {
            warn!(
                expected = batch.len(),
                received = outcomes.len(),
                "Outcome count does not match chunk size"
            );
        }

        let output = &self.config.output;
        let persisted =
            persist(&outcomes, &output.output_dir, &output.error_dir, scope, source).await;
        Ok(progress.record(&outcomes, persisted))
    }

    async fn load_urls(&self, source: &UrlSource) -> Vec<String> {
        match source {
            UrlSource::LocalFile(path) => load_local_urls(path).await,
            UrlSource::Repository(reference) => {
                fetch_repository_urls(
                    self.repository.as_ref(),
                    reference,
                    self.config.source.max_results,
                )
                .await
            }
        }
    }
}

async fn load_local_urls(path: &Path) -> Vec<String> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let urls = extract_urls(&name, &bytes);
            info!(path = %path.display(), count = urls.len(), "Loaded URLs from file");
            urls
        }
        Err(e) => {
            let e = SourceError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            };
            error!(error = %e, "Cannot load URL source");
            Vec::new()
        }
    }
}
