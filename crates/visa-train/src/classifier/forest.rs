//! Random forest of CART trees.

use rand::Rng;
use rkyv::Archive;
use serde::{Deserialize, Serialize};
use visa_model::Matrix;

use super::tree::{GrowSettings, Tree, grow_tree, seeded_rng, validate_growth};
use super::{Criterion, MaxFeatures, Predictor, argmax_lowest, n_classes};

#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Archive, rkyv::Serialize, rkyv::Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub criterion: Criterion,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub random_state: Option<u64>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            criterion: Criterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: None,
        }
    }
}

impl ForestParams {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.n_estimators == 0 {
            return Err("n_estimators must be at least 1".to_string());
        }
        validate_growth(self.min_samples_split, self.min_samples_leaf)
    }

    fn settings(&self) -> GrowSettings {
        GrowSettings {
            criterion: self.criterion,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
        }
    }
}

/// Fitted forest. Predicts by majority vote, ties to the lowest class.
#[derive(Debug, Clone, PartialEq, Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct RandomForestClassifier {
    params: ForestParams,
    trees: Vec<Tree>,
    n_classes: usize,
}

impl RandomForestClassifier {
    pub fn fit(params: &ForestParams, x: &Matrix, y: &[u8]) -> Self {
        let mut rng = seeded_rng(params.random_state);
        let n = x.rows();
        let trees: Vec<Tree> = (0..params.n_estimators)
            .map(|_| {
                let samples = if params.bootstrap {
                    (0..n).map(|_| rng.random_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                grow_tree(x, y, samples, params.settings(), &mut rng)
            })
            .collect();
        tracing::debug!(trees = trees.len(), "grew random forest");
        Self {
            params: params.clone(),
            trees,
            n_classes: n_classes(y),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Predictor for RandomForestClassifier {
    fn predict_row(&self, row: &[f64]) -> u8 {
        let mut votes = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let class = usize::from(tree.predict_row(row));
            if let Some(vote) = votes.get_mut(class) {
                *vote += 1.0;
            }
        }
        argmax_lowest(&votes)
    }
}
