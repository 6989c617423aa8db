//! Error types for the input adapters.

use std::path::PathBuf;

use thiserror::Error;

/// Loader error type.
///
/// Every variant is fatal and raised before any calibration starts.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// A constraint line could not be parsed
    #[error("Parse error at line {line} ({content:?}): {reason}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// Offending line, trimmed
        content: String,
        /// What was wrong
        reason: String,
    },

    /// The constraints are well-formed but inconsistent
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A dataset lacks required columns
    #[error("Schema error: missing columns {}", missing.join(", "))]
    Schema {
        /// Required columns not found in the header
        missing: Vec<String>,
    },

    /// A dataset row holds unusable values
    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord {
        /// 1-based data row, header excluded
        row: usize,
        /// What was wrong
        message: String,
    },

    /// A file could not be opened or written
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl LoaderError {
    /// Create a parse error.
    pub fn parse(line: usize, content: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid record error.
    pub fn invalid_record(row: usize, msg: impl Into<String>) -> Self {
        Self::InvalidRecord {
            row,
            message: msg.into(),
        }
    }

    /// Create an IO error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
