//! Data transformation stage.

use std::time::Instant;

use tracing::{info, info_span};
use visa_ingest::read_csv_table;
use visa_model::{
    DataIngestionArtifact, DataTransformationArtifact, DataTransformationConfig,
    DataValidationArtifact, Matrix, SchemaConfig,
};

use crate::column_transformer::ColumnTransformer;
use crate::error::{Result, TransformError};
use crate::features::{prepare_features, split_target};
use crate::resample::SmoteEnn;

/// Turns the ingested splits into encoded, rebalanced arrays.
pub struct DataTransformation {
    ingestion_artifact: DataIngestionArtifact,
    validation_artifact: DataValidationArtifact,
    config: DataTransformationConfig,
    schema: SchemaConfig,
}

impl DataTransformation {
    /// Load the schema named in `config`.
    pub fn new(
        ingestion_artifact: DataIngestionArtifact,
        validation_artifact: DataValidationArtifact,
        config: DataTransformationConfig,
    ) -> Result<Self> {
        let schema = SchemaConfig::load(&config.schema_file_path)?;
        Ok(Self::with_schema(
            ingestion_artifact,
            validation_artifact,
            config,
            schema,
        ))
    }

    pub fn with_schema(
        ingestion_artifact: DataIngestionArtifact,
        validation_artifact: DataValidationArtifact,
        config: DataTransformationConfig,
        schema: SchemaConfig,
    ) -> Self {
        Self {
            ingestion_artifact,
            validation_artifact,
            config,
            schema,
        }
    }

    /// Unfitted column transformer for the schema's column groups.
    pub fn get_data_transformation_object(&self) -> ColumnTransformer {
        ColumnTransformer::from_schema(&self.schema)
    }

    fn resample(&self, x: &Matrix, y: &[u8], seed: Option<u64>) -> Result<Matrix> {
        let (x_res, y_res) = SmoteEnn::new(seed).fit_resample(x, y)?;
        let labels: Vec<f64> = y_res.iter().map(|&c| f64::from(c)).collect();
        Ok(x_res.append_column(&labels))
    }

    /// Run the stage. Refuses to start when validation failed.
    pub fn initiate_data_transformation(&self) -> Result<DataTransformationArtifact> {
        let span = info_span!("transform");
        let _guard = span.enter();
        let start = Instant::now();

        if !self.validation_artifact.validation_status {
            return Err(TransformError::ValidationFailed {
                message: self.validation_artifact.message.clone(),
            });
        }

        let train_df = read_csv_table(&self.ingestion_artifact.trained_file_path)?;
        let test_df = read_csv_table(&self.ingestion_artifact.test_file_path)?;

        let (train_features, train_labels) = split_target(&train_df, &self.config.target_column)?;
        let (test_features, test_labels) = split_target(&test_df, &self.config.target_column)?;

        let drop = &self.schema.drop_columns;
        let train_features = prepare_features(&train_features, self.config.current_year, drop)?;
        let test_features = prepare_features(&test_features, self.config.current_year, drop)?;
        info!(
            train_rows = train_features.height(),
            test_rows = test_features.height(),
            "engineered company_age and dropped unused columns"
        );

        let (preprocessor, train_x) = self
            .get_data_transformation_object()
            .fit_transform(&train_features)?;
        let test_x = preprocessor.transform(&test_features)?;

        let seed = self.config.random_seed;
        let train_arr = self.resample(&train_x, &train_labels, seed)?;
        let test_arr = if self.config.balance_test_set {
            self.resample(&test_x, &test_labels, seed.map(|s| s.wrapping_add(1)))?
        } else {
            let labels: Vec<f64> = test_labels.iter().map(|&c| f64::from(c)).collect();
            test_x.append_column(&labels)
        };
        info!(
            train_rows = train_arr.rows(),
            test_rows = test_arr.rows(),
            features = train_arr.cols() - 1,
            balanced_test = self.config.balance_test_set,
            "applied SMOTEENN"
        );

        visa_persist::save_object(&preprocessor, &self.config.transformed_object_file_path)?;
        visa_persist::save_array(&train_arr, &self.config.transformed_train_file_path)?;
        visa_persist::save_array(&test_arr, &self.config.transformed_test_file_path)?;

        info!(
            duration_ms = start.elapsed().as_millis(),
            "data transformation complete"
        );
        Ok(DataTransformationArtifact {
            transformed_object_file_path: self.config.transformed_object_file_path.clone(),
            transformed_train_file_path: self.config.transformed_train_file_path.clone(),
            transformed_test_file_path: self.config.transformed_test_file_path.clone(),
        })
    }
}
