//! Model trainer stage.

use std::time::Instant;

use tracing::{info, info_span, warn};
use visa_model::{
    ClassificationMetricArtifact, DataTransformationArtifact, Matrix, ModelTrainerArtifact,
    ModelTrainerConfig,
};
use visa_transform::Preprocessor;

use crate::classifier::Predictor;
use crate::error::{Result, TrainError};
use crate::factory::{BestModelDetail, ModelFactory};
use crate::metrics::classification_metrics;
use crate::model::VisaModel;

/// Split an array with the label in its last column.
///
/// Labels must be non-negative whole numbers that fit a class code.
pub fn split_features_and_labels(array: &Matrix) -> Result<(Matrix, Vec<u8>)> {
    if array.cols() == 0 {
        return Err(TrainError::invalid_data("array has no label column"));
    }
    let (x, labels) = array.split_last_column();
    let y = labels
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            if value.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&value) {
                Ok(value as u8)
            } else {
                Err(TrainError::invalid_data(format!(
                    "row {row} has label {value}, expected a class code"
                )))
            }
        })
        .collect::<Result<Vec<u8>>>()?;
    Ok((x, y))
}

/// Selects, evaluates and persists the model.
pub struct ModelTrainer {
    transformation_artifact: DataTransformationArtifact,
    config: ModelTrainerConfig,
    factory: ModelFactory,
}

impl ModelTrainer {
    /// Load the model configuration named in `config`.
    pub fn new(
        transformation_artifact: DataTransformationArtifact,
        config: ModelTrainerConfig,
    ) -> Result<Self> {
        let factory = ModelFactory::from_file(&config.model_config_file_path)?;
        Ok(Self::with_factory(transformation_artifact, config, factory))
    }

    pub fn with_factory(
        transformation_artifact: DataTransformationArtifact,
        config: ModelTrainerConfig,
        factory: ModelFactory,
    ) -> Self {
        Self {
            transformation_artifact,
            config,
            factory,
        }
    }

    /// Search on `train`, then score the winner on `test`.
    pub fn get_model_object_and_report(
        &self,
        train: &Matrix,
        test: &Matrix,
    ) -> Result<(BestModelDetail, ClassificationMetricArtifact)> {
        let (x_train, y_train) = split_features_and_labels(train)?;
        let (x_test, y_test) = split_features_and_labels(test)?;
        if x_train.cols() != x_test.cols() {
            return Err(TrainError::invalid_data(format!(
                "train has {} features, test has {}",
                x_train.cols(),
                x_test.cols()
            )));
        }

        let best = self.factory.get_best_model(&x_train, &y_train)?;
        let predicted = best.best_model.predict(&x_test);
        let metrics = classification_metrics(&y_test, &predicted);
        info!(
            model = best.best_model.name(),
            best_score = best.best_score,
            accuracy = metrics.accuracy,
            f1 = metrics.f1_score,
            precision = metrics.precision_score,
            recall = metrics.recall_score,
            "evaluated best model on test split"
        );
        Ok((best, metrics))
    }

    /// Run the stage. Nothing is written when the accuracy gate fails.
    pub fn initiate_model_trainer(&self) -> Result<ModelTrainerArtifact> {
        let span = info_span!("train");
        let _guard = span.enter();
        let start = Instant::now();

        let train = visa_persist::load_array(&self.transformation_artifact.transformed_train_file_path)?;
        let test = visa_persist::load_array(&self.transformation_artifact.transformed_test_file_path)?;
        let preprocessor: Preprocessor =
            visa_persist::load_object(&self.transformation_artifact.transformed_object_file_path)?;
        info!(
            train_rows = train.rows(),
            test_rows = test.rows(),
            columns = train.cols(),
            combinations = self.factory.config().n_combinations(),
            cv = self.factory.config().cv,
            "loaded transformed arrays"
        );

        let (best, metrics) = self.get_model_object_and_report(&train, &test)?;
        if best.best_score < self.config.expected_accuracy {
            warn!(
                best_score = best.best_score,
                expected = self.config.expected_accuracy,
                "no model reached the expected accuracy"
            );
            return Err(TrainError::ThresholdNotMet {
                best_score: best.best_score,
                expected: self.config.expected_accuracy,
            });
        }

        let model = VisaModel::new(preprocessor, best.best_model);
        model.save(&self.config.trained_model_file_path)?;
        info!(
            model = %model,
            path = %self.config.trained_model_file_path.display(),
            duration_ms = start.elapsed().as_millis(),
            "model training complete"
        );

        Ok(ModelTrainerArtifact {
            trained_model_file_path: self.config.trained_model_file_path.clone(),
            metric_artifact: metrics,
            model_name: model.model_name().to_string(),
            best_score: best.best_score,
        })
    }
}
