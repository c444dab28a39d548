//! Classifiers available to the model factory.
//!
//! Each model class has a hyperparameter struct (deserialized from
//! `model.yaml`) and a fitted form. [`ModelParams::fit`] turns the first into
//! the second. Fitted models are wrapped in [`Classifier`] so a trained model
//! can be persisted without knowing its concrete type.

mod forest;
mod knn;
mod logistic;
mod tree;

use std::fmt;
use std::str::FromStr;

use rkyv::Archive;
use serde::{Deserialize, Serialize};
use visa_model::Matrix;

use crate::error::{Result, TrainError};

pub use forest::{ForestParams, RandomForestClassifier};
pub use knn::{KNeighborsClassifier, KnnParams, Weights};
pub use logistic::{LogisticParams, LogisticRegression};
pub use tree::{DecisionTreeClassifier, Tree, TreeParams};

/// Prediction over rows of a feature matrix.
pub trait Predictor {
    /// Class code for one feature row.
    fn predict_row(&self, row: &[f64]) -> u8;

    fn predict(&self, x: &Matrix) -> Vec<u8> {
        x.iter_rows().map(|row| self.predict_row(row)).collect()
    }
}

/// Highest vote wins. Ties go to the lowest class code.
pub(crate) fn argmax_lowest(votes: &[f64]) -> u8 {
    let mut best = 0;
    for (class, &vote) in votes.iter().enumerate() {
        if vote > votes[best] {
            best = class;
        }
    }
    best as u8
}

/// Number of classes implied by the labels, at least 2.
pub(crate) fn n_classes(y: &[u8]) -> usize {
    y.iter().copied().max().map_or(2, |m| usize::from(m) + 1).max(2)
}

pub(crate) fn check_fit_input(x: &Matrix, y: &[u8]) -> Result<()> {
    if x.rows() != y.len() {
        return Err(TrainError::invalid_data(format!(
            "{} rows but {} labels",
            x.rows(),
            y.len()
        )));
    }
    if x.is_empty() {
        return Err(TrainError::invalid_data("no training rows"));
    }
    Ok(())
}

/// Features considered at each split.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    #[default]
    All,
    Sqrt,
    Log2,
}

impl MaxFeatures {
    pub fn count(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let count = match self {
            Self::All => n_features,
            Self::Sqrt => n.sqrt() as usize,
            Self::Log2 => n.log2() as usize,
        };
        count.clamp(1, n_features.max(1))
    }
}

/// Split quality measure.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    #[default]
    Gini,
    Entropy,
}

impl Criterion {
    /// Impurity of a node with the given class counts.
    pub fn impurity(self, counts: &[usize], total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        match self {
            Self::Gini => {
                1.0 - counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / total;
                        p * p
                    })
                    .sum::<f64>()
            }
            Self::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / total;
                    p * p.log2()
                })
                .sum::<f64>(),
        }
    }
}

/// Model classes selectable in `model.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelClass {
    KNeighbors,
    DecisionTree,
    RandomForest,
    LogisticRegression,
}

impl ModelClass {
    pub const ALL: [Self; 4] = [
        Self::KNeighbors,
        Self::DecisionTree,
        Self::RandomForest,
        Self::LogisticRegression,
    ];

    /// Class name as written in `model.yaml`.
    pub fn name(self) -> &'static str {
        match self {
            Self::KNeighbors => "KNeighborsClassifier",
            Self::DecisionTree => "DecisionTreeClassifier",
            Self::RandomForest => "RandomForestClassifier",
            Self::LogisticRegression => "LogisticRegression",
        }
    }
}

impl fmt::Display for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelClass {
    type Err = String;

    /// Accepts the bare class name or a dotted path ending in it.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let name = s.rsplit('.').next().unwrap_or(s).trim();
        Self::ALL
            .into_iter()
            .find(|class| class.name() == name)
            .ok_or_else(|| s.to_string())
    }
}

/// Hyperparameters of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModelParams {
    KNeighbors(KnnParams),
    DecisionTree(TreeParams),
    RandomForest(ForestParams),
    LogisticRegression(LogisticParams),
}

impl ModelParams {
    /// Parse and check parameters for `class`. Unknown keys are rejected.
    pub fn from_yaml(
        class: ModelClass,
        value: serde_yaml::Value,
    ) -> std::result::Result<Self, String> {
        let params = match class {
            ModelClass::KNeighbors => Self::KNeighbors(parse(value)?),
            ModelClass::DecisionTree => Self::DecisionTree(parse(value)?),
            ModelClass::RandomForest => Self::RandomForest(parse(value)?),
            ModelClass::LogisticRegression => Self::LogisticRegression(parse(value)?),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn class(&self) -> ModelClass {
        match self {
            Self::KNeighbors(_) => ModelClass::KNeighbors,
            Self::DecisionTree(_) => ModelClass::DecisionTree,
            Self::RandomForest(_) => ModelClass::RandomForest,
            Self::LogisticRegression(_) => ModelClass::LogisticRegression,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::KNeighbors(p) => p.validate(),
            Self::DecisionTree(p) => p.validate(),
            Self::RandomForest(p) => p.validate(),
            Self::LogisticRegression(p) => p.validate(),
        }
    }

    /// Fit a fresh model on `x`, `y`.
    pub fn fit(&self, x: &Matrix, y: &[u8]) -> Result<Classifier> {
        check_fit_input(x, y)?;
        Ok(match self {
            Self::KNeighbors(p) => Classifier::KNeighbors(KNeighborsClassifier::fit(p, x, y)),
            Self::DecisionTree(p) => Classifier::DecisionTree(DecisionTreeClassifier::fit(p, x, y)),
            Self::RandomForest(p) => Classifier::RandomForest(RandomForestClassifier::fit(p, x, y)),
            Self::LogisticRegression(p) => {
                Classifier::LogisticRegression(LogisticRegression::fit(p, x, y)?)
            }
        })
    }
}

impl fmt::Display for ModelParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(
    value: serde_yaml::Value,
) -> std::result::Result<T, String> {
    let value = match value {
        serde_yaml::Value::Null => serde_yaml::Value::Mapping(serde_yaml::Mapping::new()),
        other => other,
    };
    serde_yaml::from_value(value).map_err(|e| e.to_string())
}

/// A fitted model of any supported class.
#[derive(Debug, Clone, PartialEq, Archive, rkyv::Serialize, rkyv::Deserialize)]
pub enum Classifier {
    KNeighbors(KNeighborsClassifier),
    DecisionTree(DecisionTreeClassifier),
    RandomForest(RandomForestClassifier),
    LogisticRegression(LogisticRegression),
}

impl Classifier {
    pub fn class(&self) -> ModelClass {
        match self {
            Self::KNeighbors(_) => ModelClass::KNeighbors,
            Self::DecisionTree(_) => ModelClass::DecisionTree,
            Self::RandomForest(_) => ModelClass::RandomForest,
            Self::LogisticRegression(_) => ModelClass::LogisticRegression,
        }
    }

    pub fn name(&self) -> &'static str {
        self.class().name()
    }
}

impl Predictor for Classifier {
    fn predict_row(&self, row: &[f64]) -> u8 {
        match self {
            Self::KNeighbors(m) => m.predict_row(row),
            Self::DecisionTree(m) => m.predict_row(row),
            Self::RandomForest(m) => m.predict_row(row),
            Self::LogisticRegression(m) => m.predict_row(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_class_parsing() {
        assert_eq!(
            "RandomForestClassifier".parse::<ModelClass>(),
            Ok(ModelClass::RandomForest)
        );
        assert_eq!(
            "sklearn.neighbors.KNeighborsClassifier".parse::<ModelClass>(),
            Ok(ModelClass::KNeighbors)
        );
        assert!("XGBClassifier".parse::<ModelClass>().is_err());
    }

    #[test]
    fn test_params_reject_unknown_keys() {
        let value: serde_yaml::Value = serde_yaml::from_str("n_neighbors: 3\nleaf_size: 30").unwrap();
        let err = ModelParams::from_yaml(ModelClass::KNeighbors, value).unwrap_err();
        assert!(err.contains("leaf_size"));
    }

    #[test]
    fn test_params_defaults_and_validation() {
        let params = ModelParams::from_yaml(ModelClass::RandomForest, serde_yaml::Value::Null).unwrap();
        match params {
            ModelParams::RandomForest(p) => {
                assert_eq!(p.n_estimators, 100);
                assert_eq!(p.max_features, MaxFeatures::Sqrt);
            }
            other => panic!("unexpected params {other:?}"),
        }

        let value: serde_yaml::Value = serde_yaml::from_str("n_neighbors: 0").unwrap();
        assert!(ModelParams::from_yaml(ModelClass::KNeighbors, value).is_err());
    }

    #[test]
    fn test_max_features_count() {
        assert_eq!(MaxFeatures::All.count(16), 16);
        assert_eq!(MaxFeatures::Sqrt.count(16), 4);
        assert_eq!(MaxFeatures::Log2.count(16), 4);
        assert_eq!(MaxFeatures::Log2.count(1), 1);
    }

    #[test]
    fn test_impurity() {
        assert_eq!(Criterion::Gini.impurity(&[5, 5], 10), 0.5);
        assert_eq!(Criterion::Gini.impurity(&[10, 0], 10), 0.0);
        assert_eq!(Criterion::Entropy.impurity(&[5, 5], 10), 1.0);
    }

    #[test]
    fn test_argmax_ties_to_lowest() {
        assert_eq!(argmax_lowest(&[2.0, 2.0]), 0);
        assert_eq!(argmax_lowest(&[1.0, 2.0]), 1);
    }
}
