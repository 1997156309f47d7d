//! Error types for chart-ab
//!
//! Every failure that touches the external `DataStore` is converted into one
//! of these variants at the boundary of the operation that performed the I/O.
//! Too-few-samples is not an error; see [`crate::stats::Significance`].

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// chart-ab error types
#[derive(Error, Debug)]
pub enum Error {
    /// Dataset or interaction log could not be read
    #[error("Data unavailable: {0}\nServing cached or empty data instead")]
    DataUnavailable(String),

    /// A single input row violated the table schema and was dropped
    #[error("Invalid row {row}: {reason}")]
    InvalidRow {
        /// Zero-based data row index (header excluded)
        row: usize,
        /// What was wrong with the row
        reason: String,
    },

    /// Appending an interaction record failed; the trial is still pending
    #[error("Failed to log interaction: {0}\nThe trial is kept so the write can be retried")]
    LogWriteFailure(String),

    /// Low-level store failure (read, write or append)
    #[error("Storage error: {0}")]
    Storage(String),

    /// A required column is missing from a table
    #[error("Schema error: {0}")]
    Schema(String),

    /// Delimited-text parse error
    #[error("CSV parse error at line {line}: {reason}")]
    Csv {
        /// One-based line number in the input
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this failure originated at the store boundary.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::DataUnavailable(_) | Self::LogWriteFailure(_) | Self::Io(_)
        )
    }
}
