//! Persistence error types.

use std::path::PathBuf;
use thiserror::Error;

/// Persistence operation error.
#[derive(Debug, Error)]
pub enum PersistError {
    /// File I/O error.
    #[error("failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not in the framed object format.
    #[error("invalid object file {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    /// Format version newer than this build understands.
    #[error("object file version {found} is not supported (maximum: {max_supported}): {path}")]
    UnsupportedVersion {
        found: u32,
        max_supported: u32,
        path: PathBuf,
    },

    #[error("failed to serialize object for {path}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to deserialize object from {path}")]
    Deserialization {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Temp file could not be renamed over the target.
    #[error("failed to move {temp_path} into place at {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistError {
    /// Hint for resolving this error, when one applies.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Io { operation, .. } => {
                if *operation == "read" {
                    Some("Check that the file exists and is readable.")
                } else {
                    Some("Check that the artifact directory is writable.")
                }
            }
            Self::InvalidFormat { .. } => {
                Some("Pass a preprocessor, model or array file written by the training pipeline.")
            }
            Self::UnsupportedVersion { .. } => Some("Retrain the model with this version."),
            Self::AtomicWriteFailed { .. } => Some("Free up disk space or choose another location."),
            Self::Serialization { .. } | Self::Deserialization { .. } => None,
        }
    }
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistError>;
