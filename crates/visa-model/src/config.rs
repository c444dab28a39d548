//! Pipeline configuration.
//!
//! [`PipelineOptions`] collects the user-facing knobs. [`TrainingPipelineConfig`]
//! turns them into one immutable config per stage, with every artifact path
//! resolved under a timestamped run directory:
//!
//! ```text
//! <artifact_root>/<timestamp>/
//!   data_ingestion/feature_store/visa_approval.csv
//!   data_ingestion/ingested/{train,test}.csv
//!   data_validation/report.json
//!   data_transformation/transformed_object/preprocessing.bin
//!   data_transformation/transformed/{train,test}.arr
//!   model_trainer/trained_model/model.bin
//! ```

use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

pub const PIPELINE_NAME: &str = "visa_approval";
pub const ARTIFACT_DIR: &str = "artifact";
pub const DATABASE_NAME: &str = "EasyVisa";
pub const COLLECTION_NAME: &str = "visa_data";
pub const TARGET_COLUMN: &str = "case_status";

pub const FILE_NAME: &str = "visa_approval.csv";
pub const TRAIN_FILE_NAME: &str = "train.csv";
pub const TEST_FILE_NAME: &str = "test.csv";
pub const PREPROCESSING_OBJECT_FILE_NAME: &str = "preprocessing.bin";
pub const TRANSFORMED_TRAIN_FILE_NAME: &str = "train.arr";
pub const TRANSFORMED_TEST_FILE_NAME: &str = "test.arr";
pub const MODEL_FILE_NAME: &str = "model.bin";
pub const VALIDATION_REPORT_FILE_NAME: &str = "report.json";

pub const DATA_INGESTION_DIR_NAME: &str = "data_ingestion";
pub const DATA_INGESTION_FEATURE_STORE_DIR: &str = "feature_store";
pub const DATA_INGESTION_INGESTED_DIR: &str = "ingested";
pub const DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO: f64 = 0.2;

pub const DATA_VALIDATION_DIR_NAME: &str = "data_validation";

pub const DATA_TRANSFORMATION_DIR_NAME: &str = "data_transformation";
pub const DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR: &str = "transformed";
pub const DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR: &str = "transformed_object";

pub const MODEL_TRAINER_DIR_NAME: &str = "model_trainer";
pub const MODEL_TRAINER_TRAINED_MODEL_DIR: &str = "trained_model";
pub const MODEL_TRAINER_EXPECTED_SCORE: f64 = 0.6;

pub const SCHEMA_FILE_PATH: &str = "config/schema.yaml";
pub const MODEL_CONFIG_FILE_PATH: &str = "config/model.yaml";

/// Environment variable naming the document store root.
pub const STORE_URL_ENV_VAR: &str = "VISA_STORE_URL";
/// Default document store root when the environment variable is unset.
pub const DEFAULT_STORE_URL: &str = "data/store";

/// Timestamp format used for run directories.
pub const TIMESTAMP_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

/// Read and deserialize a YAML file.
pub fn read_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Document store connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store location. For the filesystem store this is its root directory.
    pub url: String,
    /// Database holding the visa collection.
    pub database_name: String,
}

impl StoreConfig {
    /// Resolve the store URL from `VISA_STORE_URL`, falling back to `fallback`.
    pub fn from_env_or(fallback: Option<&str>) -> Self {
        let url = std::env::var(STORE_URL_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| fallback.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_STORE_URL.to_string());
        Self {
            url,
            database_name: DATABASE_NAME.to_string(),
        }
    }
}

/// User-facing pipeline options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Root directory under which timestamped run directories are created.
    pub artifact_root: PathBuf,
    /// Collection exported from the document store.
    pub collection_name: String,
    /// Fraction of rows assigned to the test split.
    pub split_ratio: f64,
    /// Seed for the train/test shuffle. `None` gives a different split per run.
    pub random_seed: Option<u64>,
    pub schema_file_path: PathBuf,
    pub model_config_file_path: PathBuf,
    /// Minimum best-model score accepted by the trainer.
    pub expected_accuracy: f64,
    pub target_column: String,
    /// Year used to derive `company_age`.
    pub current_year: i64,
    /// Rebalance the test split as well as the train split.
    ///
    /// On by default to match the historical pipeline output. Rebalanced test
    /// metrics are not representative of the real class distribution.
    pub balance_test_set: bool,
    /// Object storage bucket for pushing accepted models.
    pub bucket_name: Option<String>,
    /// Key of the model inside the bucket.
    pub model_key: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            artifact_root: PathBuf::from(ARTIFACT_DIR),
            collection_name: COLLECTION_NAME.to_string(),
            split_ratio: DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO,
            random_seed: None,
            schema_file_path: PathBuf::from(SCHEMA_FILE_PATH),
            model_config_file_path: PathBuf::from(MODEL_CONFIG_FILE_PATH),
            expected_accuracy: MODEL_TRAINER_EXPECTED_SCORE,
            target_column: TARGET_COLUMN.to_string(),
            current_year: i64::from(Local::now().year()),
            balance_test_set: true,
            bucket_name: None,
            model_key: MODEL_FILE_NAME.to_string(),
        }
    }
}

impl PipelineOptions {
    #[must_use]
    pub fn with_artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifact_root = root.into();
        self
    }

    #[must_use]
    pub fn with_split_ratio(mut self, ratio: f64) -> Self {
        self.split_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_random_seed(mut self, seed: Option<u64>) -> Self {
        self.random_seed = seed;
        self
    }

    #[must_use]
    pub fn with_schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_file_path = path.into();
        self
    }

    #[must_use]
    pub fn with_model_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_config_file_path = path.into();
        self
    }

    #[must_use]
    pub fn with_expected_accuracy(mut self, expected: f64) -> Self {
        self.expected_accuracy = expected;
        self
    }

    #[must_use]
    pub fn with_current_year(mut self, year: i64) -> Self {
        self.current_year = year;
        self
    }

    #[must_use]
    pub fn with_balance_test_set(mut self, enable: bool) -> Self {
        self.balance_test_set = enable;
        self
    }

    #[must_use]
    pub fn with_bucket(mut self, bucket: Option<String>) -> Self {
        self.bucket_name = bucket;
        self
    }

    #[must_use]
    pub fn with_model_key(mut self, key: impl Into<String>) -> Self {
        self.model_key = key.into();
        self
    }

    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection_name = collection.into();
        self
    }

    /// Check option ranges before any stage runs.
    pub fn validate(&self) -> Result<()> {
        if !(self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(ConfigError::invalid(format!(
                "split ratio must be in (0, 1), got {}",
                self.split_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.expected_accuracy) {
            return Err(ConfigError::invalid(format!(
                "expected accuracy must be in [0, 1], got {}",
                self.expected_accuracy
            )));
        }
        if self.target_column.trim().is_empty() {
            return Err(ConfigError::invalid("target column must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIngestionConfig {
    pub data_ingestion_dir: PathBuf,
    pub feature_store_file_path: PathBuf,
    pub training_file_path: PathBuf,
    pub testing_file_path: PathBuf,
    pub train_test_split_ratio: f64,
    pub random_seed: Option<u64>,
    pub collection_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidationConfig {
    pub data_validation_dir: PathBuf,
    pub validation_report_file_path: PathBuf,
    pub schema_file_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransformationConfig {
    pub data_transformation_dir: PathBuf,
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
    pub transformed_object_file_path: PathBuf,
    pub schema_file_path: PathBuf,
    pub target_column: String,
    pub current_year: i64,
    pub balance_test_set: bool,
    /// Seed for SMOTE interpolation. Derived from the run seed when one is set.
    pub random_seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTrainerConfig {
    pub model_trainer_dir: PathBuf,
    pub trained_model_file_path: PathBuf,
    pub expected_accuracy: f64,
    pub model_config_file_path: PathBuf,
}

/// Object storage location of the production model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    pub bucket_name: String,
    pub model_key: String,
}

/// Fully resolved configuration for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPipelineConfig {
    pub pipeline_name: String,
    pub artifact_dir: PathBuf,
    pub timestamp: String,
    pub data_ingestion: DataIngestionConfig,
    pub data_validation: DataValidationConfig,
    pub data_transformation: DataTransformationConfig,
    pub model_trainer: ModelTrainerConfig,
    pub estimator: Option<EstimatorConfig>,
}

impl TrainingPipelineConfig {
    /// Resolve every stage config for a run stamped with the current local time.
    pub fn new(options: &PipelineOptions) -> Self {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::with_timestamp(options, &timestamp)
    }

    /// Resolve every stage config under `<artifact_root>/<timestamp>`.
    pub fn with_timestamp(options: &PipelineOptions, timestamp: &str) -> Self {
        let artifact_dir = options.artifact_root.join(timestamp);

        let data_ingestion_dir = artifact_dir.join(DATA_INGESTION_DIR_NAME);
        let ingested_dir = data_ingestion_dir.join(DATA_INGESTION_INGESTED_DIR);
        let data_ingestion = DataIngestionConfig {
            feature_store_file_path: data_ingestion_dir
                .join(DATA_INGESTION_FEATURE_STORE_DIR)
                .join(FILE_NAME),
            training_file_path: ingested_dir.join(TRAIN_FILE_NAME),
            testing_file_path: ingested_dir.join(TEST_FILE_NAME),
            train_test_split_ratio: options.split_ratio,
            random_seed: options.random_seed,
            collection_name: options.collection_name.clone(),
            data_ingestion_dir,
        };

        let data_validation_dir = artifact_dir.join(DATA_VALIDATION_DIR_NAME);
        let data_validation = DataValidationConfig {
            validation_report_file_path: data_validation_dir.join(VALIDATION_REPORT_FILE_NAME),
            schema_file_path: options.schema_file_path.clone(),
            data_validation_dir,
        };

        let data_transformation_dir = artifact_dir.join(DATA_TRANSFORMATION_DIR_NAME);
        let transformed_dir = data_transformation_dir.join(DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR);
        let data_transformation = DataTransformationConfig {
            transformed_train_file_path: transformed_dir.join(TRANSFORMED_TRAIN_FILE_NAME),
            transformed_test_file_path: transformed_dir.join(TRANSFORMED_TEST_FILE_NAME),
            transformed_object_file_path: data_transformation_dir
                .join(DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR)
                .join(PREPROCESSING_OBJECT_FILE_NAME),
            schema_file_path: options.schema_file_path.clone(),
            target_column: options.target_column.clone(),
            current_year: options.current_year,
            balance_test_set: options.balance_test_set,
            random_seed: options.random_seed,
            data_transformation_dir,
        };

        let model_trainer_dir = artifact_dir.join(MODEL_TRAINER_DIR_NAME);
        let model_trainer = ModelTrainerConfig {
            trained_model_file_path: model_trainer_dir
                .join(MODEL_TRAINER_TRAINED_MODEL_DIR)
                .join(MODEL_FILE_NAME),
            expected_accuracy: options.expected_accuracy,
            model_config_file_path: options.model_config_file_path.clone(),
            model_trainer_dir,
        };

        let estimator = options.bucket_name.as_ref().map(|bucket| EstimatorConfig {
            bucket_name: bucket.clone(),
            model_key: options.model_key.clone(),
        });

        Self {
            pipeline_name: PIPELINE_NAME.to_string(),
            artifact_dir,
            timestamp: timestamp.to_string(),
            data_ingestion,
            data_validation,
            data_transformation,
            model_trainer,
            estimator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_resolve_under_run_dir() {
        let options = PipelineOptions::default().with_artifact_root("out");
        let config = TrainingPipelineConfig::with_timestamp(&options, "01_02_2024_10_00_00");

        assert_eq!(config.artifact_dir, PathBuf::from("out/01_02_2024_10_00_00"));
        assert_eq!(
            config.data_ingestion.feature_store_file_path,
            PathBuf::from("out/01_02_2024_10_00_00/data_ingestion/feature_store/visa_approval.csv")
        );
        assert_eq!(
            config.data_ingestion.testing_file_path,
            PathBuf::from("out/01_02_2024_10_00_00/data_ingestion/ingested/test.csv")
        );
        assert_eq!(
            config.data_transformation.transformed_object_file_path,
            PathBuf::from(
                "out/01_02_2024_10_00_00/data_transformation/transformed_object/preprocessing.bin"
            )
        );
        assert_eq!(
            config.model_trainer.trained_model_file_path,
            PathBuf::from("out/01_02_2024_10_00_00/model_trainer/trained_model/model.bin")
        );
        assert!(config.estimator.is_none());
    }

    #[test]
    fn test_bucket_enables_estimator() {
        let options = PipelineOptions::default().with_bucket(Some("visa-models".to_string()));
        let config = TrainingPipelineConfig::with_timestamp(&options, "ts");
        let estimator = config.estimator.expect("estimator config");
        assert_eq!(estimator.bucket_name, "visa-models");
        assert_eq!(estimator.model_key, MODEL_FILE_NAME);
    }

    #[test]
    fn test_validate_rejects_bad_ratio() {
        assert!(PipelineOptions::default().validate().is_ok());
        assert!(
            PipelineOptions::default()
                .with_split_ratio(1.0)
                .validate()
                .is_err()
        );
        assert!(
            PipelineOptions::default()
                .with_expected_accuracy(1.5)
                .validate()
                .is_err()
        );
    }
}
