//! Binary logistic regression fitted by batch gradient descent.

use rkyv::Archive;
use serde::{Deserialize, Serialize};
use visa_model::Matrix;

use super::Predictor;
use crate::error::{Result, TrainError};

#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Archive, rkyv::Serialize, rkyv::Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct LogisticParams {
    /// Inverse regularization strength.
    #[serde(rename = "C", alias = "c")]
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub fit_intercept: bool,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 0.1,
            max_iter: 1000,
            tol: 1e-6,
            fit_intercept: true,
        }
    }
}

impl LogisticParams {
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.c.is_nan() || self.c <= 0.0 {
            return Err("C must be positive".to_string());
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err("learning_rate must be positive".to_string());
        }
        if self.max_iter == 0 {
            return Err("max_iter must be at least 1".to_string());
        }
        Ok(())
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Fitted logistic regression. Predicts class 1 when `p >= 0.5`.
#[derive(Debug, Clone, PartialEq, Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct LogisticRegression {
    params: LogisticParams,
    weights: Vec<f64>,
    intercept: f64,
    n_iter: usize,
}

impl LogisticRegression {
    /// Minimise mean log loss plus `||w||² / (2·C·n)`.
    ///
    /// Stops after `max_iter` steps or once every gradient component is
    /// below `tol`. The intercept is not regularized.
    pub fn fit(params: &LogisticParams, x: &Matrix, y: &[u8]) -> Result<Self> {
        if let Some(&label) = y.iter().find(|&&label| label > 1) {
            return Err(TrainError::invalid_data(format!(
                "logistic regression needs labels 0 and 1, found {label}"
            )));
        }
        let n = x.rows() as f64;
        let d = x.cols();
        let mut weights = vec![0.0; d];
        let mut intercept = 0.0;
        let mut grad = vec![0.0; d];
        let mut n_iter = 0;

        while n_iter < params.max_iter {
            n_iter += 1;
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_b = 0.0;
            for (row, &label) in x.iter_rows().zip(y) {
                let z = intercept + dot(&weights, row);
                let err = sigmoid(z) - f64::from(label);
                for (g, &v) in grad.iter_mut().zip(row) {
                    *g += err * v;
                }
                grad_b += err;
            }
            for (g, &w) in grad.iter_mut().zip(&weights) {
                *g = *g / n + w / (params.c * n);
            }
            grad_b /= n;
            if !params.fit_intercept {
                grad_b = 0.0;
            }

            for (w, &g) in weights.iter_mut().zip(&grad) {
                *w -= params.learning_rate * g;
            }
            intercept -= params.learning_rate * grad_b;

            let largest = grad.iter().fold(grad_b.abs(), |m, g| m.max(g.abs()));
            if largest < params.tol {
                break;
            }
        }
        tracing::debug!(n_iter, "fitted logistic regression");
        Ok(Self {
            params: params.clone(),
            weights,
            intercept,
            n_iter,
        })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Probability of class 1.
    pub fn predict_proba_row(&self, row: &[f64]) -> f64 {
        sigmoid(self.intercept + dot(&self.weights, row))
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl Predictor for LogisticRegression {
    fn predict_row(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba_row(row) >= 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> (Matrix, Vec<u8>) {
        let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![f64::from(i) / 10.0 - 2.0]).collect();
        let y = (0..40).map(|i| u8::from(i >= 20)).collect();
        (Matrix::from_rows(&rows).unwrap(), y)
    }

    #[test]
    fn test_learns_linear_boundary() {
        let (x, y) = linear();
        let model = LogisticRegression::fit(&LogisticParams::default(), &x, &y).unwrap();
        assert!(model.weights()[0] > 0.0);
        assert_eq!(model.predict_row(&[-1.5]), 0);
        assert_eq!(model.predict_row(&[1.5]), 1);
    }

    #[test]
    fn test_stronger_regularization_shrinks_weights() {
        let (x, y) = linear();
        let loose = LogisticRegression::fit(&LogisticParams::default(), &x, &y).unwrap();
        let tight = LogisticRegression::fit(
            &LogisticParams {
                c: 0.01,
                ..LogisticParams::default()
            },
            &x,
            &y,
        )
        .unwrap();
        assert!(tight.weights()[0].abs() < loose.weights()[0].abs());
    }

    #[test]
    fn test_rejects_multiclass_labels() {
        let x = Matrix::zeros(2, 1);
        assert!(matches!(
            LogisticRegression::fit(&LogisticParams::default(), &x, &[0, 2]),
            Err(TrainError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(1000.0) <= 1.0);
    }

    #[test]
    fn test_c_key_spelling() {
        let upper: LogisticParams = serde_yaml::from_str("C: 0.5").unwrap();
        let lower: LogisticParams = serde_yaml::from_str("c: 0.5").unwrap();
        assert_eq!(upper.c, 0.5);
        assert_eq!(upper, lower);
    }
}
