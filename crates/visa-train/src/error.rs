//! Error types for model training.

use thiserror::Error;

/// Errors raised while configuring, searching or persisting models.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Best cross-validated score is below the configured threshold.
    #[error("no model reached the expected accuracy: best score {best_score:.4} < {expected:.4}")]
    ThresholdNotMet { best_score: f64, expected: f64 },

    /// `model.yaml` names a class this crate does not provide.
    #[error("unknown model class '{class}' in module '{module}'")]
    UnknownClass { module: String, class: String },

    /// Hyperparameters do not fit the model class.
    #[error("invalid parameters for {class} in module '{module}': {message}")]
    InvalidParams {
        module: String,
        class: String,
        message: String,
    },

    /// `model.yaml` is structurally wrong.
    #[error("invalid model config: {message}")]
    InvalidModelConfig { message: String },

    /// Training data unusable for fitting or cross-validation.
    #[error("invalid training data: {message}")]
    InvalidData { message: String },

    #[error(transparent)]
    Config(#[from] visa_model::ConfigError),

    #[error(transparent)]
    Persist(#[from] visa_persist::PersistError),

    #[error(transparent)]
    Transform(#[from] visa_transform::TransformError),
}

impl TrainError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidModelConfig {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}

/// Result type for training operations.
pub type Result<T> = std::result::Result<T, TrainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_display() {
        let err = TrainError::ThresholdNotMet {
            best_score: 0.55,
            expected: 0.6,
        };
        assert_eq!(
            err.to_string(),
            "no model reached the expected accuracy: best score 0.5500 < 0.6000"
        );
    }
}
