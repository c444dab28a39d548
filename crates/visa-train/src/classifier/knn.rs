//! Brute-force k-nearest-neighbours classifier.

use rkyv::Archive;
use serde::{Deserialize, Serialize};
use visa_model::{Matrix, squared_distance};
use visa_transform::resample::k_nearest;

use super::{Predictor, argmax_lowest, n_classes};

/// Neighbour vote weighting.
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
pub enum Weights {
    #[default]
    Uniform,
    Distance,
}

#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Archive, rkyv::Serialize, rkyv::Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct KnnParams {
    pub n_neighbors: usize,
    pub weights: Weights,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            weights: Weights::Uniform,
        }
    }
}

impl KnnParams {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.n_neighbors == 0 {
            return Err("n_neighbors must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Fitted KNN model. Keeps the full training set.
#[derive(Debug, Clone, PartialEq, Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct KNeighborsClassifier {
    params: KnnParams,
    x: Matrix,
    y: Vec<u8>,
    n_classes: usize,
}

impl KNeighborsClassifier {
    /// `n_neighbors` above the sample count uses every sample.
    pub fn fit(params: &KnnParams, x: &Matrix, y: &[u8]) -> Self {
        Self {
            params: params.clone(),
            x: x.clone(),
            y: y.to_vec(),
            n_classes: n_classes(y),
        }
    }

    pub fn params(&self) -> &KnnParams {
        &self.params
    }
}

impl Predictor for KNeighborsClassifier {
    fn predict_row(&self, row: &[f64]) -> u8 {
        let candidates: Vec<usize> = (0..self.x.rows()).collect();
        let k = self.params.n_neighbors.min(candidates.len());
        let neighbours = k_nearest(&self.x, row, &candidates, None, k);

        let mut votes = vec![0.0; self.n_classes];
        match self.params.weights {
            Weights::Uniform => {
                for &i in &neighbours {
                    votes[usize::from(self.y[i])] += 1.0;
                }
            }
            Weights::Distance => {
                let distances: Vec<f64> = neighbours
                    .iter()
                    .map(|&i| squared_distance(row, self.x.row(i)).sqrt())
                    .collect();
                // Exact matches outvote everything else.
                let exact = distances.iter().any(|&d| d == 0.0);
                for (&i, &d) in neighbours.iter().zip(&distances) {
                    let weight = match (exact, d == 0.0) {
                        (true, true) => 1.0,
                        (true, false) => 0.0,
                        (false, _) => 1.0 / d,
                    };
                    votes[usize::from(self.y[i])] += weight;
                }
            }
        }
        argmax_lowest(&votes)
    }
}
