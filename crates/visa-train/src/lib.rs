//! Model selection and training for the visa approval pipeline.
//!
//! [`ModelFactory`] grid-searches every candidate in `model.yaml` with
//! stratified k-fold cross-validation and refits each candidate's best
//! parameters on the full training set. [`ModelTrainer`] scores the winner on
//! the held-out split, applies the accuracy gate and persists a [`VisaModel`].

pub mod classifier;
mod error;
pub mod factory;
pub mod metrics;
mod model;
pub mod model_config;
mod trainer;

pub use classifier::{Classifier, ModelClass, ModelParams, Predictor};
pub use error::{Result, TrainError};
pub use factory::{BestModelDetail, GridSearchedModel, ModelFactory};
pub use metrics::classification_metrics;
pub use model::VisaModel;
pub use model_config::ModelConfig;
pub use trainer::{ModelTrainer, split_features_and_labels};
