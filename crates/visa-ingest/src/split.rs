//! Random train/test split.

use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{IngestError, Result};

/// Number of test rows for `rows` rows at `ratio`: `ceil(ratio * rows)`.
pub fn test_size(rows: usize, ratio: f64) -> usize {
    (ratio * rows as f64).ceil() as usize
}

/// Shuffle rows and split them into `(train, test)`.
///
/// Without a seed the shuffle differs on every call. The split is not
/// stratified. Both sides must end up non-empty.
pub fn train_test_split(
    df: &DataFrame,
    ratio: f64,
    seed: Option<u64>,
) -> Result<(DataFrame, DataFrame)> {
    let rows = df.height();
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(IngestError::InvalidSplit {
            rows,
            ratio,
            reason: "ratio must be in (0, 1)",
        });
    }

    let n_test = test_size(rows, ratio);
    if n_test == 0 {
        return Err(IngestError::InvalidSplit {
            rows,
            ratio,
            reason: "test set would be empty",
        });
    }
    if n_test >= rows {
        return Err(IngestError::InvalidSplit {
            rows,
            ratio,
            reason: "training set would be empty",
        });
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut indices: Vec<u32> = (0..rows).map(|idx| idx as u32).collect();
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);
    let train = df.take(&UInt32Chunked::from_vec("idx".into(), train_idx.to_vec()))?;
    let test = df.take(&UInt32Chunked::from_vec("idx".into(), test_idx.to_vec()))?;
    Ok((train, test))
}
