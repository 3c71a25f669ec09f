// ============================================================
// Layer 3: Data Errors
// ============================================================
// Every failure in the pipeline reflects malformed input or
// misuse, never a transient condition, so nothing here is
// retried. Components return DataError and the application
// layer wraps it with anyhow context on the way out.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)
//            thiserror crate documentation

use thiserror::Error;

use crate::domain::split::{Split, Stage};

/// Result alias used by the domain and data layers.
pub type DataResult<T> = std::result::Result<T, DataError>;

#[derive(Debug, Error)]
pub enum DataError {
    /// The source file is missing, unreadable, or not valid CSV.
    #[error("data source '{path}' is unavailable: {reason}")]
    DataSourceUnavailable { path: String, reason: String },

    /// Cleaning removed every row.
    #[error("no rows left after cleaning")]
    EmptyDataset,

    /// A setting or a split size makes the requested operation impossible.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A window index outside `[0, len)`.
    #[error("window index {index} is out of range for {len} windows")]
    IndexOutOfRange { index: usize, len: usize },

    /// A split was requested before setup ran for the stage that owns it.
    #[error("{split} data requested before setup ran for the '{stage}' stage")]
    NotInitialized { split: Split, stage: Stage },

    /// A column the pipeline relies on is absent from the header.
    #[error("required column '{0}' is missing from the source table")]
    MissingColumn(String),

    /// A cell that should be numeric (or a date) could not be parsed.
    #[error("record {row}, column '{column}': cannot parse '{value}'")]
    MalformedValue {
        row:    usize,
        column: String,
        value:  String,
    },

    #[error("scaler must be fitted before transform")]
    ScalerNotFitted,
}
