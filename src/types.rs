//! Core types for adscan

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

/// One configured ad-library instance found on a page (e.g. a `pbjs` global)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationInstance {
    /// Global name the instance is exposed under
    pub instance_name: String,

    /// Reported library version
    #[serde(default)]
    pub version: String,

    /// Installed modules, in the order the page reports them
    #[serde(default)]
    pub module_names: Vec<String>,
}

/// Raw result of inspecting one loaded page
///
/// This is the shape the page inspector hands back; the executor turns it into
/// [`ExtractedPageData`] once it is known to carry a signal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionReport {
    /// Names of ad libraries detected on the page
    #[serde(default)]
    pub detected_libraries: BTreeSet<String>,

    /// Configured integration instances
    #[serde(default)]
    pub integration_instances: Vec<IntegrationInstance>,
}

impl InspectionReport {
    /// True if the page showed any integration evidence at all
    pub fn has_signal(&self) -> bool {
        !self.detected_libraries.is_empty() || !self.integration_instances.is_empty()
    }
}

/// Structured evidence extracted from one page, as stored in the record store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPageData {
    /// Page URL
    pub url: String,

    /// Calendar date the extraction ran
    pub scan_date: NaiveDate,

    /// Detected library names
    pub detected_libraries: BTreeSet<String>,

    /// Integration instances in page order
    pub integration_instances: Vec<IntegrationInstance>,
}

impl ExtractedPageData {
    /// Build page data from an inspection report
    pub fn from_report(
        url: impl Into<String>,
        scan_date: NaiveDate,
        report: InspectionReport,
    ) -> Self {
        Self {
            url: url.into(),
            scan_date,
            detected_libraries: report.detected_libraries,
            integration_instances: report.integration_instances,
        }
    }
}

/// Classified result of visiting one URL
///
/// Exactly one outcome is produced per dispatched URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Extraction produced at least one signal
    Success(ExtractedPageData),

    /// Page loaded but carried no integration evidence
    NoSignal {
        /// Visited URL
        url: String,
    },

    /// Visit or extraction raised an error
    Failure {
        /// Visited URL
        url: String,
        /// Short machine-parsable token (e.g. `ERR_NAME_NOT_RESOLVED`)
        error_code: String,
        /// Original error text
        message: String,
    },
}

impl TaskOutcome {
    /// URL this outcome belongs to
    pub fn url(&self) -> &str {
        match self {
            TaskOutcome::Success(data) => &data.url,
            TaskOutcome::NoSignal { url } | TaskOutcome::Failure { url, .. } => url,
        }
    }

    /// True for [`TaskOutcome::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }
}

/// Error log category an unsuccessful outcome is routed to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Page visited, nothing found
    NoSignal,
    /// DNS, connection or timeout class failure
    NavigationError,
    /// Any other failure
    ProcessingError,
}

impl ErrorCategory {
    /// Fixed log file name for this category under the error directory
    pub fn log_file_name(&self) -> &'static str {
        match self {
            ErrorCategory::NoSignal => "no-signal.txt",
            ErrorCategory::NavigationError => "navigation-error.txt",
            ErrorCategory::ProcessingError => "processing-error.txt",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorCategory::NoSignal => "no-signal",
            ErrorCategory::NavigationError => "navigation-error",
            ErrorCategory::ProcessingError => "processing-error",
        };
        f.write_str(label)
    }
}

/// Ordered, immutable list of URLs dispatched in one execution round
///
/// Cloning is cheap; the URLs are shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanBatch {
    urls: Arc<[String]>,
}

impl ScanBatch {
    /// Create a batch from URLs in dispatch order
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls: urls.into() }
    }

    /// URLs in dispatch order
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Iterate URLs in dispatch order
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.urls.iter()
    }

    /// Number of URLs in the batch
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// True if the batch holds no URLs
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl From<Vec<String>> for ScanBatch {
    fn from(urls: Vec<String>) -> Self {
        Self::new(urls)
    }
}

impl<'a> IntoIterator for &'a ScanBatch {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Where the URL set for a run comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UrlSource {
    /// A local file; line-delimited text files are reconciled after each chunk
    LocalFile(PathBuf),
    /// A repository root or a direct link to a file inside one
    Repository(String),
}

impl UrlSource {
    /// Local file path, if this is a local source
    pub fn local_path(&self) -> Option<&std::path::Path> {
        match self {
            UrlSource::LocalFile(path) => Some(path),
            UrlSource::Repository(_) => None,
        }
    }
}

/// Counts reported at the end of a run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// URLs in scope after range selection
    pub urls_in_scope: usize,
    /// Chunks dispatched and persisted
    pub chunks_processed: usize,
    /// Successful extractions
    pub succeeded: usize,
    /// Pages without integration evidence
    pub no_signal: usize,
    /// Navigation-class failures
    pub navigation_errors: usize,
    /// Processing-class failures
    pub processing_errors: usize,
    /// Records written to the record store
    pub records_written: usize,
}

impl RunSummary {
    /// Total outcomes observed
    pub fn total_outcomes(&self) -> usize {
        self.succeeded + self.no_signal + self.navigation_errors + self.processing_errors
    }
}
