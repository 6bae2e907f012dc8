//! Error types for scanning and caching.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur while scanning or caching a directory index.
///
/// Unreadable subtrees, truncated scans and corrupt cache records are
/// recovered where they happen and never surface here.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The root does not exist or is not a directory.
    #[error("invalid root {}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    /// A cache record could not be written.
    #[error("failed to write cache record {}: {source}", path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IndexError {
    pub(crate) fn invalid_root(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
