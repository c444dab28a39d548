//! Error types for visa data ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while exporting, splitting or writing data.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Document Store Errors ===
    /// Store root does not exist.
    #[error("document store not reachable at {url}")]
    StoreUnavailable { url: String },

    /// Collection not present in the store.
    #[error("collection '{database}.{collection}' not found")]
    CollectionNotFound {
        database: String,
        collection: String,
    },

    /// Collection exists but holds no documents.
    #[error("collection '{collection}' is empty")]
    EmptyCollection { collection: String },

    /// A stored document is not a JSON object.
    #[error("invalid document in {path} at entry {index}: {message}")]
    InvalidDocument {
        path: PathBuf,
        index: usize,
        message: String,
    },

    // === File System Errors ===
    /// CSV file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or write file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Errors ===
    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Failed to serialize CSV with Polars.
    #[error("failed to write CSV {path}: {message}")]
    CsvWrite { path: PathBuf, message: String },

    // === Split Errors ===
    /// Split ratio leaves one side empty.
    #[error("cannot split {rows} rows with test ratio {ratio}: {reason}")]
    InvalidSplit {
        rows: usize,
        ratio: f64,
        reason: &'static str,
    },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::CollectionNotFound {
            database: "EasyVisa".to_string(),
            collection: "visa_data".to_string(),
        };
        assert_eq!(err.to_string(), "collection 'EasyVisa.visa_data' not found");

        let err = IngestError::InvalidSplit {
            rows: 1,
            ratio: 0.2,
            reason: "training set would be empty",
        };
        assert!(err.to_string().contains("1 rows"));
    }
}
