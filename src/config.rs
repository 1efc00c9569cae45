//! Configuration types for adscan

use crate::error::{Error, Result};
use crate::types::UrlSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How a batch of URLs is dispatched to the page inspector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// One shared inspection session, one URL at a time
    Sequential,
    /// Bounded worker pool pulling from a shared queue (default)
    #[default]
    Pooled,
}

impl std::str::FromStr for ConcurrencyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(ConcurrencyMode::Sequential),
            "pooled" => Ok(ConcurrencyMode::Pooled),
            other => Err(Error::config(
                format!("unknown concurrency mode '{other}' (expected 'sequential' or 'pooled')"),
                "mode",
            )),
        }
    }
}

/// Where the URL set comes from
///
/// Exactly one of `file` and `repository` should be set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Local input file (text, JSON/YAML, or CSV/TSV)
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Repository reference (`owner/repo`, repository URL, or a direct file link)
    #[serde(default)]
    pub repository: Option<String>,

    /// Maximum number of URLs to take from a repository (None = unlimited)
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl SourceConfig {
    /// Resolve the configured source, if any
    pub fn url_source(&self) -> Option<UrlSource> {
        if let Some(path) = &self.file {
            return Some(UrlSource::LocalFile(path.clone()));
        }
        self.repository
            .as_ref()
            .map(|reference| UrlSource::Repository(reference.clone()))
    }
}

/// Dispatch behaviour (concurrency, timeouts, partitioning)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Concurrency strategy (default: pooled)
    #[serde(default)]
    pub mode: ConcurrencyMode,

    /// Maximum number of pages visited at once in pooled mode (default: 5)
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: usize,

    /// Per-visit timeout in milliseconds (default: 30000)
    #[serde(default = "default_visit_timeout_ms")]
    pub visit_timeout_ms: u64,

    /// 1-based inclusive range of URLs to process (`"start-end"`, `"start-"`, `"-end"`)
    #[serde(default)]
    pub range: Option<String>,

    /// Number of URLs dispatched and persisted per round (None or 0 = all at once)
    #[serde(default)]
    pub chunk_size: Option<usize>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ConcurrencyMode::default(),
            max_parallelism: default_max_parallelism(),
            visit_timeout_ms: default_visit_timeout_ms(),
            range: None,
            chunk_size: None,
        }
    }
}

impl ExecutionConfig {
    /// Per-visit timeout as a [`Duration`]
    pub fn visit_timeout(&self) -> Duration {
        Duration::from_millis(self.visit_timeout_ms)
    }
}

/// Output locations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root of the dated record store (default: "./output")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory holding the per-category URL logs (default: "./errors")
    #[serde(default = "default_error_dir")]
    pub error_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            error_dir: default_error_dir(),
        }
    }
}

/// Repository API access
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// GitHub API base URL (default: "https://api.github.com")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bearer token for authenticated requests
    #[serde(default)]
    pub token: Option<String>,

    /// HTTP request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: None,
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// External page inspector program
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InspectorConfig {
    /// Path to the inspector executable (searched on PATH as `adscan-inspect` if None)
    #[serde(default)]
    pub program: Option<PathBuf>,

    /// Extra arguments passed before the URL
    #[serde(default)]
    pub args: Vec<String>,
}

/// Main configuration for a scan run
///
/// Fields are grouped into sub-configs:
/// - [`source`](SourceConfig) - where URLs come from
/// - [`execution`](ExecutionConfig) - concurrency, timeouts, range and chunking
/// - [`output`](OutputConfig) - record store and error log locations
/// - [`repository`](RepositoryConfig) - repository API access
/// - [`inspector`](InspectorConfig) - external page inspector program
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// URL source
    #[serde(default)]
    pub source: SourceConfig,

    /// Dispatch behaviour
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Output locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Repository API access
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Page inspector program
    #[serde(default)]
    pub inspector: InspectorConfig,
}

impl ScanConfig {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or is not valid JSON.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read config file {}: {}", path.display(), e),
            key: None,
        })?;
        serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("invalid config file {}: {}", path.display(), e),
            key: None,
        })
    }

    /// Check the configuration for values the pipeline cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.execution.max_parallelism == 0 {
            return Err(Error::config(
                "max_parallelism must be a positive integer",
                "max_parallelism",
            ));
        }
        if self.execution.visit_timeout_ms == 0 {
            return Err(Error::config(
                "visit_timeout_ms must be greater than zero",
                "visit_timeout_ms",
            ));
        }
        if self.source.file.is_some() && self.source.repository.is_some() {
            return Err(Error::config(
                "configure either a local file or a repository as the URL source, not both",
                "source",
            ));
        }
        Ok(())
    }
}

fn default_max_parallelism() -> usize {
    5
}

fn default_visit_timeout_ms() -> u64 {
    30_000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_error_dir() -> PathBuf {
    PathBuf::from("./errors")
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("adscan/", env!("CARGO_PKG_VERSION")).to_string()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
