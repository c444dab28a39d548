use std::path::Path;
use std::time::Instant;

use polars::prelude::DataFrame;
use tracing::{info, info_span, warn};
use visa_ingest::read_csv_table;
use visa_model::{DataIngestionArtifact, DataValidationArtifact, DataValidationConfig, SchemaConfig};

use crate::error::Result;
use crate::report::{DatasetReport, ValidationReport};

/// Validates the ingested splits against the schema.
pub struct DataValidation {
    ingestion_artifact: DataIngestionArtifact,
    config: DataValidationConfig,
    schema: SchemaConfig,
}

impl DataValidation {
    /// Load the schema named in `config`.
    pub fn new(
        ingestion_artifact: DataIngestionArtifact,
        config: DataValidationConfig,
    ) -> Result<Self> {
        let schema = SchemaConfig::load(&config.schema_file_path)?;
        Ok(Self::with_schema(ingestion_artifact, config, schema))
    }

    pub fn with_schema(
        ingestion_artifact: DataIngestionArtifact,
        config: DataValidationConfig,
        schema: SchemaConfig,
    ) -> Self {
        Self {
            ingestion_artifact,
            config,
            schema,
        }
    }

    /// Whether `df` has exactly as many columns as the schema declares.
    pub fn validate_number_of_columns(&self, df: &DataFrame) -> bool {
        let ok = df.width() == self.schema.columns.len();
        info!(
            expected = self.schema.columns.len(),
            found = df.width(),
            ok,
            "column count check"
        );
        ok
    }

    /// Entries of `expected` that are not columns of `df`.
    pub fn missing_columns(df: &DataFrame, expected: &[String]) -> Vec<String> {
        expected
            .iter()
            .filter(|name| df.column(name.as_str()).is_err())
            .cloned()
            .collect()
    }

    fn check_dataset(&self, name: &str, df: &DataFrame) -> DatasetReport {
        let report = DatasetReport {
            dataset: name.to_string(),
            rows: df.height(),
            columns: df.width(),
            expected_columns: self.schema.columns.len(),
            column_count_ok: self.validate_number_of_columns(df),
            missing_numerical_columns: Self::missing_columns(df, &self.schema.numerical_columns),
            missing_categorical_columns: Self::missing_columns(
                df,
                &self.schema.categorical_columns,
            ),
        };
        for message in report.failures() {
            warn!(dataset = name, "{message}");
        }
        report
    }

    fn read(path: &Path) -> Result<DataFrame> {
        Ok(read_csv_table(path)?)
    }

    /// Check both splits and write the report.
    pub fn initiate_data_validation(&self) -> Result<DataValidationArtifact> {
        let span = info_span!("validate");
        let _guard = span.enter();
        let start = Instant::now();

        let train = Self::read(&self.ingestion_artifact.trained_file_path)?;
        let test = Self::read(&self.ingestion_artifact.test_file_path)?;

        let report = ValidationReport::from_datasets(vec![
            self.check_dataset("training", &train),
            self.check_dataset("test", &test),
        ]);

        let json = serde_json::to_vec_pretty(&report)?;
        visa_persist::write_atomic(&self.config.validation_report_file_path, &json)?;

        info!(
            status = report.validation_status,
            report = %self.config.validation_report_file_path.display(),
            duration_ms = start.elapsed().as_millis(),
            "data validation complete"
        );

        Ok(DataValidationArtifact {
            validation_status: report.validation_status,
            message: report.message,
            report_file_path: self.config.validation_report_file_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{Column, DataFrame};

    #[test]
    fn test_missing_columns_keeps_order() {
        let df = DataFrame::new(vec![Column::new("continent".into(), vec!["Asia"])]).unwrap();
        let expected = vec![
            "region_of_employment".to_string(),
            "continent".to_string(),
            "unit_of_wage".to_string(),
        ];
        assert_eq!(
            DataValidation::missing_columns(&df, &expected),
            vec!["region_of_employment", "unit_of_wage"]
        );
    }
}
