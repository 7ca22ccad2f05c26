//! Error types for repofetch.
//!
//! Every failure is surfaced to the immediate caller. Read timeouts are the
//! only retried condition and never appear here on their own; they either
//! resolve into a successful fetch or into [`FetchError::MaxRetriesExceeded`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for link fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to open local file {path:?}: {source}")]
    LocalAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Request to {url} failed: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Exceeded max retries of {max_retries} fetching {url}")]
    MaxRetriesExceeded { url: String, max_retries: u32 },

    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("I/O error transferring {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP session: {message}")]
    Session {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for repofetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Config {
            message: format!("invalid options: {}", err),
        }
    }
}

impl FetchError {
    /// Wrap a transport error for `url`.
    pub fn request(url: impl Into<String>, source: reqwest::Error) -> Self {
        FetchError::RequestFailed {
            url: url.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        FetchError::Config {
            message: message.into(),
        }
    }

    /// Whether this error came from the local filesystem rather than the network.
    pub fn is_local(&self) -> bool {
        matches!(self, FetchError::LocalAccess { .. })
    }

    /// Whether every allowed attempt ended in a read timeout.
    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self, FetchError::MaxRetriesExceeded { .. })
    }
}
