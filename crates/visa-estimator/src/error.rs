//! Error types for object storage and the estimator.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by [`ObjectStorage`](crate::ObjectStorage) backends and
/// [`VisaEstimator`](crate::VisaEstimator).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket '{bucket}' does not exist")]
    BucketNotFound { bucket: String },

    #[error("object '{key}' not found in bucket '{bucket}'")]
    KeyNotFound { bucket: String, key: String },

    /// Keys are relative paths without `..` components.
    #[error("invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("failed to {operation} '{path}': {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Persist(#[from] visa_persist::PersistError),

    #[error(transparent)]
    Model(#[from] visa_train::TrainError),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
