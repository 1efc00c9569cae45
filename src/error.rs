//! Error types for adscan
//!
//! The taxonomy mirrors how failures are absorbed by the pipeline:
//! - [`SourceError`] - unreadable input files, unreachable or malformed repositories
//! - [`Error::Visit`] - a single page visit failed (absorbed into a `Failure` outcome)
//! - [`PersistenceError`] - record store or error log writes failed
//! - [`Error::Config`] - invalid or missing run configuration
//!
//! Only configuration and executor setup errors ever reach the caller of
//! [`Scanner::run`](crate::scanner::Scanner::run). Source and persistence errors are
//! logged at the component that hit them and degrade to partial results, so they
//! have their own enums and never convert into [`Error`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for adscan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for adscan
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_parallelism")
        key: Option<String>,
    },

    /// A page visit or in-page extraction failed
    #[error("{0}")]
    Visit(String),

    /// Execution context (inspection session) could not be created
    #[error("execution setup failed: {0}")]
    Setup(String),

    /// External tool execution failed (inspector binary, etc.)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// HTTP client could not be built
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Errors raised while resolving a URL source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Local input file could not be read
    #[error("cannot read {path}: {reason}")]
    Unreadable {
        /// The file that could not be read
        path: PathBuf,
        /// The underlying reason
        reason: String,
    },

    /// Repository reference could not be parsed
    #[error("invalid repository reference: {0}")]
    InvalidReference(String),

    /// Repository API answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Repository listing payload was not the expected list of entries
    #[error("unexpected listing payload from {url}: {reason}")]
    UnexpectedPayload {
        /// Requested URL
        url: String,
        /// What was wrong with the payload
        reason: String,
    },

    /// Request could not be sent or its body could not be read
    #[error("request to {url} failed: {reason}")]
    Request {
        /// Requested URL
        url: String,
        /// The underlying reason
        reason: String,
    },
}

/// Errors raised while persisting outcomes
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Creating an output directory failed
    #[error("failed to create directory {path}: {reason}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// The underlying reason
        reason: String,
    },

    /// Reading a file that is about to be rewritten failed
    #[error("failed to read {path}: {reason}")]
    Read {
        /// File that could not be read
        path: PathBuf,
        /// The underlying reason
        reason: String,
    },

    /// Writing a file failed
    #[error("failed to write {path}: {reason}")]
    Write {
        /// File that could not be written
        path: PathBuf,
        /// The underlying reason
        reason: String,
    },

    /// Encoding records failed
    #[error("failed to encode records for {path}: {reason}")]
    Encode {
        /// Target file
        path: PathBuf,
        /// The underlying reason
        reason: String,
    },
}

impl Error {
    /// Short machine-readable label for the error kind, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Visit(_) => "visit_error",
            Error::Setup(_) => "setup_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::Network(_) => "network_error",
        }
    }

    /// Shorthand for a configuration error tied to a config key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
