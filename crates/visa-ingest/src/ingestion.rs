//! Data ingestion stage.

use std::time::Instant;

use polars::prelude::DataFrame;
use tracing::{info, info_span};
use visa_model::{DataIngestionArtifact, DataIngestionConfig};

use crate::csv::write_csv_table;
use crate::error::Result;
use crate::split::train_test_split;
use crate::store::{DocumentStore, export_collection_as_dataframe};

/// Exports the visa collection to the feature store and splits it.
pub struct DataIngestion<'a, S: DocumentStore + ?Sized> {
    config: DataIngestionConfig,
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> DataIngestion<'a, S> {
    pub fn new(config: DataIngestionConfig, store: &'a S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &DataIngestionConfig {
        &self.config
    }

    /// Fetch the collection and write it unmodified to the feature store CSV.
    pub fn export_data_into_feature_store(&self) -> Result<DataFrame> {
        let mut df = export_collection_as_dataframe(self.store, &self.config.collection_name)?;
        write_csv_table(&mut df, &self.config.feature_store_file_path)?;
        info!(
            path = %self.config.feature_store_file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "feature store written"
        );
        Ok(df)
    }

    /// Split `df` and write the train and test CSVs.
    pub fn split_data_as_train_test(&self, df: &DataFrame) -> Result<()> {
        let (mut train, mut test) = train_test_split(
            df,
            self.config.train_test_split_ratio,
            self.config.random_seed,
        )?;
        write_csv_table(&mut train, &self.config.training_file_path)?;
        write_csv_table(&mut test, &self.config.testing_file_path)?;
        info!(
            train_rows = train.height(),
            test_rows = test.height(),
            ratio = self.config.train_test_split_ratio,
            "train/test split written"
        );
        Ok(())
    }

    /// Run export and split.
    pub fn initiate_data_ingestion(&self) -> Result<DataIngestionArtifact> {
        let span = info_span!("ingest", collection = %self.config.collection_name);
        let _guard = span.enter();
        let start = Instant::now();

        let df = self.export_data_into_feature_store()?;
        self.split_data_as_train_test(&df)?;

        info!(duration_ms = start.elapsed().as_millis(), "data ingestion complete");
        Ok(DataIngestionArtifact {
            trained_file_path: self.config.training_file_path.clone(),
            test_file_path: self.config.testing_file_path.clone(),
        })
    }
}
