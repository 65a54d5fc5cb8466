//! Error types for record sources

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while collecting records
#[derive(Debug, Error)]
pub enum SourceError {
    /// Reading the input failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV input is malformed
    #[error("Invalid CSV input: {0}")]
    Csv(#[from] csv::Error),

    /// The JSON input is malformed
    #[error("Invalid JSON input at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The input format could not be determined
    #[error("Cannot determine input format for {0}; use --format")]
    UnknownFormat(String),

    /// The collector is not available on this platform
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

impl SourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SourceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for record sources
pub type SourceResult<T> = Result<T, SourceError>;
