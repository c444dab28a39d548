//! Binary classification metrics.
//!
//! Class `1` is the positive class. A ratio with a zero denominator is 0.

use visa_model::ClassificationMetricArtifact;

/// Confusion counts for the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionCounts {
    pub const POSITIVE: u8 = 1;

    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut counts = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t == Self::POSITIVE, p == Self::POSITIVE) {
                (true, true) => counts.true_positive += 1,
                (false, true) => counts.false_positive += 1,
                (false, false) => counts.true_negative += 1,
                (true, false) => counts.false_negative += 1,
            }
        }
        counts
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Fraction of exact matches.
pub fn accuracy_score(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    ratio(correct, y_true.len())
}

pub fn precision_score(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let c = ConfusionCounts::from_labels(y_true, y_pred);
    ratio(c.true_positive, c.true_positive + c.false_positive)
}

pub fn recall_score(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let c = ConfusionCounts::from_labels(y_true, y_pred);
    ratio(c.true_positive, c.true_positive + c.false_negative)
}

/// Harmonic mean of precision and recall.
pub fn f1_score(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let c = ConfusionCounts::from_labels(y_true, y_pred);
    ratio(
        2 * c.true_positive,
        2 * c.true_positive + c.false_positive + c.false_negative,
    )
}

/// All four scores in one record.
pub fn classification_metrics(y_true: &[u8], y_pred: &[u8]) -> ClassificationMetricArtifact {
    ClassificationMetricArtifact {
        accuracy: accuracy_score(y_true, y_pred),
        f1_score: f1_score(y_true, y_pred),
        precision_score: precision_score(y_true, y_pred),
        recall_score: recall_score(y_true, y_pred),
    }
}
