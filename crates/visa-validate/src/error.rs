//! Error types for data validation.

use thiserror::Error;

/// Infrastructure failures while validating. Check failures are not errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Config(#[from] visa_model::ConfigError),

    #[error(transparent)]
    Ingest(#[from] visa_ingest::IngestError),

    #[error(transparent)]
    Persist(#[from] visa_persist::PersistError),

    #[error("failed to encode validation report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, ValidationError>;
