//! Error types
//!
//! Storage failures and document failures are kept apart so the router can
//! tell "file absent" (not an error at all) from real I/O problems.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a `DocumentStore`
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure while reading or writing a JSON document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("path escapes the served directory: {0}")]
    Forbidden(String),
}

impl DocumentError {
    /// HTTP status this error maps to at the request boundary
    pub const fn status(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::Store(_) | Self::Utf8(_) | Self::Parse(_) => 500,
        }
    }
}
