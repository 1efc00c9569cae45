//! Page inspection boundary
//!
//! The scan pipeline never talks to a browser directly. It opens an
//! [`InspectionSession`] through a [`PageInspector`] and asks the session to visit
//! one URL at a time. Sequential dispatch shares one session across a batch; pooled
//! dispatch opens one session per worker.
//!
//! [`CommandInspector`] is the production implementation: it runs an external
//! program once per visit and reads an [`InspectionReport`] as JSON from its stdout.

use crate::config::InspectorConfig;
use crate::error::{Error, Result};
use crate::types::InspectionReport;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Name of the inspector program looked up on PATH when none is configured
pub const DEFAULT_INSPECTOR_PROGRAM: &str = "adscan-inspect";

/// An open execution context able to visit pages
#[async_trait]
pub trait InspectionSession: Send + Sync {
    /// Load `url` and report the ad-technology integration found on it
    ///
    /// # Errors
    ///
    /// Returns [`Error::Visit`] (or another error) if navigation or extraction fails.
    /// The error text is used to derive the outcome's error code.
    async fn inspect(&self, url: &str, timeout: Duration) -> Result<InspectionReport>;

    /// Release the session's resources
    async fn close(&self) {}
}

/// Factory for inspection sessions
///
/// # Examples
///
/// ```no_run
/// use adscan::inspector::{CommandInspector, PageInspector};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let inspector = CommandInspector::from_path().expect("adscan-inspect not found in PATH");
///
/// let session = inspector.open_session().await?;
/// let report = session.inspect("https://example.com", Duration::from_secs(30)).await?;
/// println!("libraries: {:?}", report.detected_libraries);
/// session.close().await;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait PageInspector: Send + Sync {
    /// Open a new session
    ///
    /// # Errors
    ///
    /// Returns [`Error::Setup`] if the execution context cannot be created.
    async fn open_session(&self) -> Result<Box<dyn InspectionSession>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Inspector that runs an external program per visit
///
/// The program is invoked as `<program> <args...> <url> <timeout_ms>` and must print
/// a JSON object with `detectedLibraries` and `integrationInstances` to stdout. A
/// non-zero exit status is a failed visit; its stderr becomes the error message.
pub struct CommandInspector {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandInspector {
    /// Create an inspector with an explicit program path and leading arguments
    pub fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// Attempt to find [`DEFAULT_INSPECTOR_PROGRAM`] in PATH
    pub fn from_path() -> Option<Self> {
        which::which(DEFAULT_INSPECTOR_PROGRAM)
            .ok()
            .map(|program| Self::new(program, Vec::new()))
    }

    /// Build from configuration, defaulting to [`DEFAULT_INSPECTOR_PROGRAM`]
    ///
    /// The program is only looked up when a session is opened, so a missing
    /// inspector surfaces as a setup error of the first dispatched chunk.
    pub fn from_config(config: &InspectorConfig) -> Self {
        let program = config
            .program
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INSPECTOR_PROGRAM));
        Self::new(program, config.args.clone())
    }

    fn resolve_program(&self) -> Result<PathBuf> {
        if self.program.is_file() {
            return Ok(self.program.clone());
        }
        which::which(&self.program).map_err(|e| {
            Error::Setup(format!(
                "inspector program {} is not available: {}",
                self.program.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl PageInspector for CommandInspector {
    async fn open_session(&self) -> Result<Box<dyn InspectionSession>> {
        let program = self.resolve_program()?;
        debug!(program = %program.display(), "Opened command inspection session");
        Ok(Box::new(CommandSession {
            program,
            args: self.args.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

/// Session of a [`CommandInspector`]; each visit is one child process
struct CommandSession {
    program: PathBuf,
    args: Vec<String>,
}

#[async_trait]
impl InspectionSession for CommandSession {
    async fn inspect(&self, url: &str, timeout: Duration) -> Result<InspectionReport> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .arg(timeout.as_millis().to_string())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("Failed to execute inspector: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("inspector exited with {}", output.status)
            } else {
                stderr
            };
            return Err(Error::Visit(message));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::Visit(format!("invalid inspector output: {}", e)))
    }
}
