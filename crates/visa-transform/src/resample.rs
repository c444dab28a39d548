//! Class rebalancing: SMOTE oversampling followed by Edited Nearest Neighbours.
//!
//! SMOTE grows the minority class to the size of the majority class with
//! points interpolated between a minority sample and one of its nearest
//! minority neighbours. ENN then removes every sample whose nearest
//! neighbours do not all share its class.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use visa_model::{Matrix, squared_distance};

use crate::error::{Result, TransformError};

/// Indices of the `k` rows of `candidates` closest to `query`, nearest first.
///
/// Ties keep the lower candidate position.
pub fn k_nearest(
    data: &Matrix,
    query: &[f64],
    candidates: &[usize],
    exclude: Option<usize>,
    k: usize,
) -> Vec<usize> {
    let mut best: Vec<(f64, usize)> = Vec::with_capacity(k + 1);
    for &idx in candidates {
        if Some(idx) == exclude {
            continue;
        }
        let dist = squared_distance(query, data.row(idx));
        if best.len() == k && best.last().is_some_and(|(d, _)| dist >= *d) {
            continue;
        }
        let pos = best.partition_point(|(d, _)| *d <= dist);
        best.insert(pos, (dist, idx));
        best.truncate(k);
    }
    best.into_iter().map(|(_, idx)| idx).collect()
}

fn class_counts(y: &[u8]) -> Vec<(u8, usize)> {
    let mut counts: Vec<(u8, usize)> = Vec::new();
    for &label in y {
        match counts.iter_mut().find(|(c, _)| *c == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label, 1)),
        }
    }
    counts.sort_unstable();
    counts
}

/// Synthetic minority oversampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smote {
    pub k_neighbors: usize,
}

impl Default for Smote {
    fn default() -> Self {
        Self { k_neighbors: 5 }
    }
}

impl Smote {
    /// Oversample the minority class up to the majority count.
    ///
    /// Output rows are the input rows followed by the synthetic rows.
    pub fn fit_resample<R: Rng>(
        &self,
        x: &Matrix,
        y: &[u8],
        rng: &mut R,
    ) -> Result<(Matrix, Vec<u8>)> {
        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(TransformError::Resampling {
                message: format!("need at least two classes, found {}", counts.len()),
            });
        }
        // Ties resolve to the lowest class code.
        let (minority, n_min) = counts
            .iter()
            .copied()
            .min_by_key(|(_, n)| *n)
            .unwrap_or_default();
        let n_max = counts.iter().map(|(_, n)| *n).max().unwrap_or_default();

        let mut out = x.clone();
        let mut labels = y.to_vec();
        let n_new = n_max - n_min;
        if n_new == 0 {
            return Ok((out, labels));
        }
        if n_min < 2 {
            return Err(TransformError::Resampling {
                message: format!("minority class {minority} has {n_min} sample(s), need at least 2"),
            });
        }

        let k = self.k_neighbors.min(n_min - 1);
        let minority_idx: Vec<usize> = (0..y.len()).filter(|&i| y[i] == minority).collect();
        let neighbours: Vec<Vec<usize>> = minority_idx
            .iter()
            .map(|&i| k_nearest(x, x.row(i), &minority_idx, Some(i), k))
            .collect();

        let mut synthetic = vec![0.0; x.cols()];
        for _ in 0..n_new {
            let pick = rng.random_range(0..minority_idx.len());
            let nn = neighbours[pick][rng.random_range(0..neighbours[pick].len())];
            let gap: f64 = rng.random();
            let base = x.row(minority_idx[pick]);
            let other = x.row(nn);
            for (j, value) in synthetic.iter_mut().enumerate() {
                *value = base[j] + gap * (other[j] - base[j]);
            }
            out.push_row(&synthetic);
            labels.push(minority);
        }

        tracing::debug!(minority, generated = n_new, k, "SMOTE oversampling");
        Ok((out, labels))
    }
}

/// Edited Nearest Neighbours cleaning over all classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditedNearestNeighbours {
    pub n_neighbors: usize,
}

impl Default for EditedNearestNeighbours {
    fn default() -> Self {
        Self { n_neighbors: 3 }
    }
}

impl EditedNearestNeighbours {
    /// Keep samples whose neighbours all share their class.
    ///
    /// Kept rows are grouped by class code, original order within a class.
    pub fn fit_resample(&self, x: &Matrix, y: &[u8]) -> (Matrix, Vec<u8>) {
        let all: Vec<usize> = (0..x.rows()).collect();
        let keep: Vec<bool> = all
            .iter()
            .map(|&i| {
                k_nearest(x, x.row(i), &all, Some(i), self.n_neighbors)
                    .iter()
                    .all(|&j| y[j] == y[i])
            })
            .collect();

        let mut indices = Vec::new();
        for (class, _) in class_counts(y) {
            indices.extend(all.iter().copied().filter(|&i| y[i] == class && keep[i]));
        }
        let labels = indices.iter().map(|&i| y[i]).collect();
        tracing::debug!(
            removed = x.rows() - indices.len(),
            kept = indices.len(),
            "ENN cleaning"
        );
        (x.select_rows(&indices), labels)
    }
}

/// SMOTE on the minority class followed by ENN on all classes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SmoteEnn {
    pub smote: Smote,
    pub enn: EditedNearestNeighbours,
    pub random_state: Option<u64>,
}

impl SmoteEnn {
    pub fn new(random_state: Option<u64>) -> Self {
        Self {
            random_state,
            ..Self::default()
        }
    }

    pub fn fit_resample(&self, x: &Matrix, y: &[u8]) -> Result<(Matrix, Vec<u8>)> {
        if x.rows() != y.len() {
            return Err(TransformError::Shape {
                message: format!("{} rows but {} labels", x.rows(), y.len()),
            });
        }
        let mut rng = match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (x_over, y_over) = self.smote.fit_resample(x, y, &mut rng)?;
        Ok(self.enn.fit_resample(&x_over, &y_over))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced() -> (Matrix, Vec<u8>) {
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            rows.push(vec![f64::from(i % 8) * 0.1, f64::from(i / 8) * 0.1]);
            y.push(0);
        }
        for i in 0..8 {
            rows.push(vec![5.0 + f64::from(i % 4) * 0.1, 5.0 + f64::from(i / 4) * 0.1]);
            y.push(1);
        }
        (Matrix::from_rows(&rows).unwrap(), y)
    }

    #[test]
    fn test_k_nearest_orders_by_distance() {
        let m = Matrix::from_rows(&[vec![0.0], vec![3.0], vec![1.0], vec![2.0]]).unwrap();
        let all = [0, 1, 2, 3];
        assert_eq!(k_nearest(&m, &[0.0], &all, Some(0), 2), vec![2, 3]);
        assert_eq!(k_nearest(&m, &[0.0], &all, None, 10), vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_smote_balances_classes() {
        let (x, y) = imbalanced();
        let mut rng = StdRng::seed_from_u64(1);
        let (xs, ys) = Smote::default().fit_resample(&x, &y, &mut rng).unwrap();
        assert_eq!(xs.rows(), 80);
        assert_eq!(ys.iter().filter(|&&c| c == 1).count(), 40);
        // Synthetic points lie inside the minority cluster.
        for i in 48..80 {
            let row = xs.row(i);
            assert!(row[0] >= 5.0 && row[0] <= 5.3 && row[1] >= 5.0 && row[1] <= 5.1);
        }
    }

    #[test]
    fn test_smote_single_class_fails() {
        let x = Matrix::from_rows(&[vec![0.0], vec![1.0]]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            Smote::default().fit_resample(&x, &[0, 0], &mut rng),
            Err(TransformError::Resampling { .. })
        ));
    }

    #[test]
    fn test_smote_lone_minority_fails() {
        let x = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![2.0]]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            Smote::default().fit_resample(&x, &[0, 0, 1], &mut rng),
            Err(TransformError::Resampling { .. })
        ));
    }

    #[test]
    fn test_enn_removes_mislabelled_point() {
        let mut rows: Vec<Vec<f64>> = (0..20).map(|i| vec![f64::from(i) * 0.1]).collect();
        rows.extend((0..6).map(|i| vec![10.0 + f64::from(i) * 0.1]));
        rows.push(vec![0.95]);
        let mut y = vec![0; 20];
        y.extend(vec![1; 6]);
        y.push(1);
        let x = Matrix::from_rows(&rows).unwrap();

        let (xs, ys) = EditedNearestNeighbours::default().fit_resample(&x, &y);
        // The outlier and its four class-0 neighbours go.
        assert_eq!(xs.rows(), 22);
        assert!(!xs.as_slice().contains(&0.95));
        assert_eq!(ys[..16], [0; 16]);
        assert_eq!(ys[16..], [1; 6]);
    }

    #[test]
    fn test_smote_enn_seeded_is_reproducible() {
        let (x, y) = imbalanced();
        let a = SmoteEnn::new(Some(9)).fit_resample(&x, &y).unwrap();
        let b = SmoteEnn::new(Some(9)).fit_resample(&x, &y).unwrap();
        assert_eq!(a, b);
        let denied = a.1.iter().filter(|&&c| c == 1).count();
        assert!(denied > 8);
    }

    #[test]
    fn test_shape_mismatch() {
        let x = Matrix::zeros(3, 1);
        assert!(matches!(
            SmoteEnn::new(Some(1)).fit_resample(&x, &[0, 1]),
            Err(TransformError::Shape { .. })
        ));
    }
}
