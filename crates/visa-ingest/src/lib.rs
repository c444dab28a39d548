//! Visa data ingestion.
//!
//! This crate moves the raw visa collection out of the document store and
//! onto disk:
//!
//! - **Data access**: [`DocumentStore`] backends and
//!   [`export_collection_as_dataframe`]
//! - **CSV I/O**: [`read_csv_table`] and [`write_csv_table`]
//! - **Splitting**: [`train_test_split`] with an optional seed
//! - **Stage**: [`DataIngestion`] writes the feature store and the split files
//!
//! # Example
//!
//! ```ignore
//! use visa_ingest::{DataIngestion, DocumentStoreClient};
//! use visa_model::{PipelineOptions, StoreConfig, TrainingPipelineConfig};
//!
//! let config = TrainingPipelineConfig::new(&PipelineOptions::default());
//! let client = DocumentStoreClient::connect(&StoreConfig::from_env_or(None))?;
//! let artifact = DataIngestion::new(config.data_ingestion, &client).initiate_data_ingestion()?;
//! ```

mod csv;
mod error;
mod ingestion;
mod split;
mod store;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV ===
pub use csv::{read_csv_table, write_csv_table};

// === Data Access ===
pub use store::{
    Document, DocumentStore, DocumentStoreClient, InMemoryStore, export_collection_as_dataframe,
};

// === Splitting ===
pub use split::{test_size, train_test_split};

// === Stage ===
pub use ingestion::DataIngestion;
