//! Error types for data transformation.

use thiserror::Error;

/// Errors raised while engineering, encoding or resampling features.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Validation stage reported failure.
    #[error("data validation failed: {message}")]
    ValidationFailed { message: String },

    /// Column required by a transformer is absent.
    #[error("column '{column}' not found")]
    MissingColumn { column: String },

    /// Category not seen while fitting.
    #[error("unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    /// Categorical cell is null.
    #[error("null value in categorical column '{column}' at row {row}")]
    NullCategory { column: String, row: usize },

    /// Numeric cell is null or does not parse.
    #[error("null or non-numeric value in column '{column}' at row {row}")]
    InvalidNumeric { column: String, row: usize },

    /// Target label outside the fixed mapping.
    #[error("unknown target label '{value}' in column '{column}'")]
    UnknownLabel { column: String, value: String },

    /// Resampling precondition not met.
    #[error("cannot resample: {message}")]
    Resampling { message: String },

    /// Matrix and label shapes disagree.
    #[error("shape mismatch: {message}")]
    Shape { message: String },

    #[error(transparent)]
    Config(#[from] visa_model::ConfigError),

    #[error(transparent)]
    Ingest(#[from] visa_ingest::IngestError),

    #[error(transparent)]
    Persist(#[from] visa_persist::PersistError),

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for TransformError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for transformation operations.
pub type Result<T> = std::result::Result<T, TransformError>;
