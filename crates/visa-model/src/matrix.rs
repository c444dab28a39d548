//! Dense row-major matrix.

use rkyv::{Archive, Deserialize, Serialize};

/// Row-major `f64` matrix.
///
/// Transformed feature arrays, resampled training data and persisted
/// train/test arrays all use this layout. When a label is attached it is the
/// last column.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// All-zero matrix of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap a row-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "matrix buffer length {} does not match shape {rows}x{cols}",
            data.len()
        );
        Self { rows, cols, data }
    }

    /// Build from rows. Returns `None` when rows have different lengths.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return None;
            }
            data.extend_from_slice(row);
        }
        Some(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Build from columns. Returns `None` when columns have different lengths.
    pub fn from_columns(columns: &[Vec<f64>]) -> Option<Self> {
        let rows = columns.first().map_or(0, Vec::len);
        if columns.iter().any(|c| c.len() != rows) {
            return None;
        }
        let cols = columns.len();
        let mut data = vec![0.0; rows * cols];
        for (j, column) in columns.iter().enumerate() {
            for (i, value) in column.iter().enumerate() {
                data[i * cols + j] = *value;
            }
        }
        Some(Self { rows, cols, data })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let start = i * self.cols;
        &mut self.data[start..start + self.cols]
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] = value;
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// Copy of column `j`.
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self.get(i, j)).collect()
    }

    /// Append a column on the right.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != self.rows()`.
    pub fn append_column(&self, values: &[f64]) -> Self {
        assert_eq!(values.len(), self.rows, "column length mismatch");
        let cols = self.cols + 1;
        let mut data = Vec::with_capacity(self.rows * cols);
        for (i, value) in values.iter().enumerate() {
            data.extend_from_slice(self.row(i));
            data.push(*value);
        }
        Self {
            rows: self.rows,
            cols,
            data,
        }
    }

    /// Split off the last column, returning `(features, last_column)`.
    ///
    /// A matrix without columns yields an empty feature matrix and an empty label vector.
    pub fn split_last_column(&self) -> (Self, Vec<f64>) {
        if self.cols == 0 {
            return (Self::zeros(self.rows, 0), Vec::new());
        }
        let feature_cols = self.cols - 1;
        let mut data = Vec::with_capacity(self.rows * feature_cols);
        let mut last = Vec::with_capacity(self.rows);
        for row in self.iter_rows() {
            data.extend_from_slice(&row[..feature_cols]);
            last.push(row[feature_cols]);
        }
        (
            Self {
                rows: self.rows,
                cols: feature_cols,
                data,
            },
            last,
        )
    }

    /// Gather the given rows, in order. Indices may repeat.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            rows: indices.len(),
            cols: self.cols,
            data,
        }
    }

    /// Append rows from a vector of equal-width rows.
    ///
    /// # Panics
    ///
    /// Panics if a row width differs from `self.cols()`.
    pub fn push_row(&mut self, row: &[f64]) {
        assert_eq!(row.len(), self.cols, "row width mismatch");
        self.data.extend_from_slice(row);
        self.rows += 1;
    }
}

/// Squared Euclidean distance between two equal-length rows.
#[inline]
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
