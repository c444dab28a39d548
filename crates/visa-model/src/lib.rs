//! Data model types for the visa approval training pipeline.
//!
//! This crate holds everything the pipeline stages pass between each other:
//!
//! - [`config`]: immutable per-stage configuration derived from [`PipelineOptions`]
//! - [`artifact`]: records produced by each stage and consumed by the next
//! - [`schema`]: column groups declared in `schema.yaml`
//! - [`target`]: the fixed `case_status` label encoding
//! - [`matrix`]: dense row-major numeric matrix used for transformed data
//! - [`error`]: configuration errors

pub mod artifact;
pub mod config;
pub mod error;
pub mod matrix;
pub mod schema;
pub mod target;

pub use artifact::{
    ClassificationMetricArtifact, DataIngestionArtifact, DataTransformationArtifact,
    DataValidationArtifact, ModelTrainerArtifact,
};
pub use config::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, EstimatorConfig,
    ModelTrainerConfig, PipelineOptions, StoreConfig, TrainingPipelineConfig, read_yaml_file,
};
pub use error::{ConfigError, Result};
pub use matrix::{Matrix, squared_distance};
pub use schema::SchemaConfig;
pub use target::{CaseStatus, TargetValueMapping};
