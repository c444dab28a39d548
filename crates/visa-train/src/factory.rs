//! Grid search with stratified k-fold cross-validation.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};
use visa_model::Matrix;

use crate::classifier::{Classifier, ModelClass, ModelParams, Predictor};
use crate::error::{Result, TrainError};
use crate::metrics::accuracy_score;
use crate::model_config::{CandidateSpec, ModelConfig};

/// Outcome of searching one candidate's grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSearchedModel {
    pub key: String,
    pub class: ModelClass,
    pub best_params: ModelParams,
    /// Mean cross-validated accuracy of `best_params`.
    pub best_score: f64,
    /// Refit on the full training data with `best_params`.
    pub best_model: Classifier,
}

/// Winner across all candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct BestModelDetail {
    pub best_model: Classifier,
    pub best_params: ModelParams,
    pub best_score: f64,
    pub key: String,
}

/// Fold index per sample.
///
/// Samples are ordered by class, then dealt to folds round-robin, so each
/// fold keeps roughly the class proportions and no fold is empty.
pub fn stratified_folds(y: &[u8], n_splits: usize) -> Result<Vec<usize>> {
    if n_splits < 2 {
        return Err(TrainError::invalid_data(format!(
            "cross-validation needs at least 2 folds, got {n_splits}"
        )));
    }
    if y.len() < n_splits {
        return Err(TrainError::invalid_data(format!(
            "cannot split {} samples into {n_splits} folds",
            y.len()
        )));
    }
    let mut order: Vec<usize> = (0..y.len()).collect();
    order.sort_by_key(|&i| y[i]);
    let mut folds = vec![0; y.len()];
    for (position, &i) in order.iter().enumerate() {
        folds[i] = position % n_splits;
    }
    Ok(folds)
}

/// Mean held-out accuracy of `params` over the folds.
pub fn cross_val_score(
    params: &ModelParams,
    x: &Matrix,
    y: &[u8],
    folds: &[usize],
    n_splits: usize,
) -> Result<f64> {
    let mut total = 0.0;
    for fold in 0..n_splits {
        let (train_idx, test_idx): (Vec<usize>, Vec<usize>) =
            (0..y.len()).partition(|&i| folds[i] != fold);
        let y_train: Vec<u8> = train_idx.iter().map(|&i| y[i]).collect();
        let y_test: Vec<u8> = test_idx.iter().map(|&i| y[i]).collect();
        let model = params.fit(&x.select_rows(&train_idx), &y_train)?;
        let predicted = model.predict(&x.select_rows(&test_idx));
        total += accuracy_score(&y_test, &predicted);
    }
    Ok(total / n_splits as f64)
}

/// Picks the best model described by a [`ModelConfig`].
#[derive(Debug, Clone)]
pub struct ModelFactory {
    config: ModelConfig,
}

impl ModelFactory {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// Read and check `model.yaml`.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(ModelConfig::load(path)?))
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn search_candidate(
        &self,
        candidate: &CandidateSpec,
        x: &Matrix,
        y: &[u8],
        folds: &[usize],
    ) -> Result<GridSearchedModel> {
        let start = Instant::now();
        let mut best: Option<(f64, &ModelParams)> = None;
        for params in &candidate.grid {
            let score = cross_val_score(params, x, y, folds, self.config.cv)?;
            debug!(key = %candidate.key, %params, score, "cross-validated");
            if best.is_none_or(|(best_score, _)| score > best_score) {
                best = Some((score, params));
            }
        }
        let Some((best_score, best_params)) = best else {
            return Err(TrainError::invalid_config(format!(
                "model_selection.{} has no parameter combinations",
                candidate.key
            )));
        };
        let best_model = best_params.fit(x, y)?;
        info!(
            key = %candidate.key,
            class = %candidate.class,
            combinations = candidate.grid.len(),
            best_score,
            best_params = %best_params,
            duration_ms = start.elapsed().as_millis(),
            "grid search finished"
        );
        Ok(GridSearchedModel {
            key: candidate.key.clone(),
            class: candidate.class,
            best_params: best_params.clone(),
            best_score,
            best_model,
        })
    }

    /// Grid-search every candidate in file order.
    pub fn initiate_best_parameter_search(
        &self,
        x: &Matrix,
        y: &[u8],
    ) -> Result<Vec<GridSearchedModel>> {
        if x.rows() != y.len() {
            return Err(TrainError::invalid_data(format!(
                "{} rows but {} labels",
                x.rows(),
                y.len()
            )));
        }
        let folds = stratified_folds(y, self.config.cv)?;
        self.config
            .candidates
            .iter()
            .map(|candidate| self.search_candidate(candidate, x, y, &folds))
            .collect()
    }

    /// Highest cross-validated score wins. Ties keep the earlier candidate.
    pub fn get_best_model(&self, x: &Matrix, y: &[u8]) -> Result<BestModelDetail> {
        let searched = self.initiate_best_parameter_search(x, y)?;
        let mut best: Option<GridSearchedModel> = None;
        for model in searched {
            if best.as_ref().is_none_or(|b| model.best_score > b.best_score) {
                best = Some(model);
            }
        }
        let best = best.ok_or_else(|| TrainError::invalid_config("model_selection is empty"))?;
        Ok(BestModelDetail {
            best_model: best.best_model,
            best_params: best.best_params,
            best_score: best.best_score,
            key: best.key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable(n: usize) -> (Matrix, Vec<u8>) {
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..n {
            let class = u8::from(i % 3 == 0);
            let base = if class == 1 { 4.0 } else { 0.0 };
            rows.push(vec![base + (i % 7) as f64 * 0.1, base - (i % 5) as f64 * 0.1]);
            y.push(class);
        }
        (Matrix::from_rows(&rows).unwrap(), y)
    }

    #[test]
    fn test_stratified_folds_balance_classes() {
        let y = [0, 0, 0, 0, 0, 0, 1, 1, 1, 1];
        let folds = stratified_folds(&y, 2).unwrap();
        for fold in 0..2 {
            let members: Vec<u8> = (0..y.len()).filter(|&i| folds[i] == fold).map(|i| y[i]).collect();
            assert_eq!(members.len(), 5);
            assert_eq!(members.iter().filter(|&&c| c == 1).count(), 2);
        }
    }

    #[test]
    fn test_stratified_folds_too_few_samples() {
        assert!(stratified_folds(&[0, 1], 3).is_err());
        assert!(stratified_folds(&[0, 1, 0], 1).is_err());
    }

    #[test]
    fn test_best_model_on_separable_data() {
        let config = ModelConfig::from_yaml_str(
            r#"
grid_search:
  cv: 3
model_selection:
  module_0:
    class: KNeighborsClassifier
    search_param_grid:
      n_neighbors: [1, 3]
  module_1:
    class: DecisionTreeClassifier
    params:
      max_depth: 2
"#,
        )
        .unwrap();
        let (x, y) = separable(30);
        let factory = ModelFactory::new(config);

        let searched = factory.initiate_best_parameter_search(&x, &y).unwrap();
        assert_eq!(searched.len(), 2);
        assert!(searched.iter().all(|m| m.best_score == 1.0));

        let best = factory.get_best_model(&x, &y).unwrap();
        // Perfect scores tie, so the first candidate and its first combination win.
        assert_eq!(best.key, "module_0");
        assert_eq!(best.best_model.class(), ModelClass::KNeighbors);
        assert_eq!(best.best_params.to_string(), r#"{"n_neighbors":1,"weights":"uniform"}"#);
        assert_eq!(best.best_model.predict(&x), y);
    }

    #[test]
    fn test_cross_val_score_below_one_for_noise() {
        let x = Matrix::from_rows(&(0..12).map(|i| vec![f64::from(i)]).collect::<Vec<_>>()).unwrap();
        let y: Vec<u8> = (0..12).map(|i| u8::from(i % 2 == 0)).collect();
        let params = ModelParams::from_yaml(
            ModelClass::KNeighbors,
            serde_yaml::from_str("n_neighbors: 1").unwrap(),
        )
        .unwrap();
        let folds = stratified_folds(&y, 3).unwrap();
        let score = cross_val_score(&params, &x, &y, &folds, 3).unwrap();
        assert!(score < 0.5);
    }
}
