//! Training pipeline orchestration.
//!
//! Runs `ingest -> validate -> transform -> train` once. Each stage gets its
//! own immutable config and the previous stage's artifact. The first error
//! ends the run.

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, info_span};
use visa_ingest::{DataIngestion, DocumentStore, IngestError};
use visa_model::{
    ConfigError, DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact,
    ModelTrainerArtifact, TrainingPipelineConfig,
};
use visa_persist::PersistError;
use visa_train::{ModelTrainer, TrainError};
use visa_transform::{DataTransformation, TransformError};
use visa_validate::{DataValidation, ValidationError};

/// File written next to the stage directories after an accepted run.
pub const RUN_SUMMARY_FILE_NAME: &str = "run_summary.json";

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pipeline failure kinds.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Filesystem, CSV, document store, object storage or persistence failure.
    #[error("{stage} failed: {source}")]
    Io {
        stage: &'static str,
        #[source]
        source: BoxedError,
    },

    /// Data validation rejected the ingested splits.
    #[error("data validation failed: {message}")]
    ValidationFailed { message: String },

    /// No candidate model reached the expected accuracy.
    #[error("no model reached the expected accuracy: best score {best_score:.4} < {expected:.4}")]
    ThresholdNotMet { best_score: f64, expected: f64 },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("data transformation failed: {0}")]
    Transform(TransformError),

    #[error("model training failed: {0}")]
    Train(TrainError),
}

impl PipelineError {
    pub fn io(stage: &'static str, source: impl Into<BoxedError>) -> Self {
        Self::Io {
            stage,
            source: source.into(),
        }
    }

    fn from_ingest(stage: &'static str, err: IngestError) -> Self {
        Self::io(stage, err)
    }

    fn from_persist(stage: &'static str, err: PersistError) -> Self {
        Self::io(stage, err)
    }

    fn from_validation(err: ValidationError) -> Self {
        match err {
            ValidationError::Config(e) => Self::Config(e),
            ValidationError::Ingest(e) => Self::from_ingest("data validation", e),
            ValidationError::Persist(e) => Self::from_persist("data validation", e),
            ValidationError::Report(e) => Self::io("data validation", e),
        }
    }

    fn from_transform(err: TransformError) -> Self {
        match err {
            TransformError::ValidationFailed { message } => Self::ValidationFailed { message },
            TransformError::Config(e) => Self::Config(e),
            TransformError::Ingest(e) => Self::from_ingest("data transformation", e),
            TransformError::Persist(e) => Self::from_persist("data transformation", e),
            other => Self::Transform(other),
        }
    }

    fn from_train(err: TrainError) -> Self {
        match err {
            TrainError::ThresholdNotMet {
                best_score,
                expected,
            } => Self::ThresholdNotMet {
                best_score,
                expected,
            },
            TrainError::Config(e) => Self::Config(e),
            TrainError::Persist(e) => Self::from_persist("model training", e),
            TrainError::Transform(e) => Self::from_transform(e),
            other => Self::Train(other),
        }
    }

    /// Short machine-readable kind, used in run summaries and exit handling.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::ThresholdNotMet { .. } => "threshold_not_met",
            Self::Config(_) => "config",
            Self::Transform(_) => "transform",
            Self::Train(_) => "train",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Artifacts of an accepted run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineRun {
    pub pipeline_name: String,
    pub timestamp: String,
    pub artifact_dir: std::path::PathBuf,
    pub data_ingestion: DataIngestionArtifact,
    pub data_validation: DataValidationArtifact,
    pub data_transformation: DataTransformationArtifact,
    pub model_trainer: ModelTrainerArtifact,
    pub duration_ms: u128,
}

/// One configured training run over a document store.
pub struct TrainingPipeline<S: DocumentStore> {
    config: TrainingPipelineConfig,
    store: S,
}

impl<S: DocumentStore> TrainingPipeline<S> {
    pub fn new(config: TrainingPipelineConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &TrainingPipelineConfig {
        &self.config
    }

    pub fn start_data_ingestion(&self) -> Result<DataIngestionArtifact> {
        DataIngestion::new(self.config.data_ingestion.clone(), &self.store)
            .initiate_data_ingestion()
            .map_err(|e| PipelineError::from_ingest("data ingestion", e))
    }

    pub fn start_data_validation(
        &self,
        ingestion: &DataIngestionArtifact,
    ) -> Result<DataValidationArtifact> {
        DataValidation::new(ingestion.clone(), self.config.data_validation.clone())
            .and_then(|stage| stage.initiate_data_validation())
            .map_err(PipelineError::from_validation)
    }

    /// Refuses to run on a failed validation.
    pub fn start_data_transformation(
        &self,
        ingestion: &DataIngestionArtifact,
        validation: &DataValidationArtifact,
    ) -> Result<DataTransformationArtifact> {
        if !validation.validation_status {
            return Err(PipelineError::ValidationFailed {
                message: validation.message.clone(),
            });
        }
        DataTransformation::new(
            ingestion.clone(),
            validation.clone(),
            self.config.data_transformation.clone(),
        )
        .and_then(|stage| stage.initiate_data_transformation())
        .map_err(PipelineError::from_transform)
    }

    pub fn start_model_trainer(
        &self,
        transformation: &DataTransformationArtifact,
    ) -> Result<ModelTrainerArtifact> {
        ModelTrainer::new(transformation.clone(), self.config.model_trainer.clone())
            .and_then(|stage| stage.initiate_model_trainer())
            .map_err(PipelineError::from_train)
    }

    /// Run every stage and write the run summary.
    pub fn run_pipeline(&self) -> Result<PipelineRun> {
        let span = info_span!(
            "pipeline",
            name = %self.config.pipeline_name,
            timestamp = %self.config.timestamp
        );
        let _guard = span.enter();
        let start = Instant::now();

        let data_ingestion = self.start_data_ingestion()?;
        let data_validation = self.start_data_validation(&data_ingestion)?;
        let data_transformation =
            self.start_data_transformation(&data_ingestion, &data_validation)?;
        let model_trainer = self.start_model_trainer(&data_transformation)?;

        let run = PipelineRun {
            pipeline_name: self.config.pipeline_name.clone(),
            timestamp: self.config.timestamp.clone(),
            artifact_dir: self.config.artifact_dir.clone(),
            data_ingestion,
            data_validation,
            data_transformation,
            model_trainer,
            duration_ms: start.elapsed().as_millis(),
        };
        self.write_run_summary(&run)?;
        info!(
            model = %run.model_trainer.model_name,
            best_score = run.model_trainer.best_score,
            duration_ms = run.duration_ms,
            "training pipeline complete"
        );
        Ok(run)
    }

    fn write_run_summary(&self, run: &PipelineRun) -> Result<()> {
        let path = self.config.artifact_dir.join(RUN_SUMMARY_FILE_NAME);
        let json = serde_json::to_vec_pretty(run).map_err(|e| PipelineError::io("run summary", e))?;
        visa_persist::write_atomic(&path, &json)
            .map_err(|e| PipelineError::from_persist("run summary", e))
    }
}
