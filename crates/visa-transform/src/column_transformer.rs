//! Column transformer and its fitted form, the preprocessor.

use polars::prelude::DataFrame;
use rkyv::{Archive, Deserialize, Serialize};
use visa_model::{Matrix, SchemaConfig};

use crate::encoders::{ColumnEncoder, OneHotEncoder, OrdinalEncoder, PowerTransformer, StandardScaler};
use crate::error::{Result, TransformError};

/// Unfitted four-branch transformer.
///
/// Output columns are concatenated in branch order: one-hot, ordinal, power
/// transform, standard scaling. Columns outside every branch are dropped.
/// Column existence is only checked when fitting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnTransformer {
    pub oh_columns: Vec<String>,
    pub or_columns: Vec<String>,
    pub transform_columns: Vec<String>,
    pub num_features: Vec<String>,
}

impl ColumnTransformer {
    pub fn from_schema(schema: &SchemaConfig) -> Self {
        Self {
            oh_columns: schema.oh_columns.clone(),
            or_columns: schema.or_columns.clone(),
            transform_columns: schema.transform_columns.clone(),
            num_features: schema.num_features.clone(),
        }
    }

    /// Fit every branch on `df`.
    pub fn fit(&self, df: &DataFrame) -> Result<Preprocessor> {
        let preprocessor = Preprocessor {
            one_hot: OneHotEncoder::fit(df, &self.oh_columns)?,
            ordinal: OrdinalEncoder::fit(df, &self.or_columns)?,
            power: PowerTransformer::fit(df, &self.transform_columns)?,
            scaler: StandardScaler::fit(df, &self.num_features)?,
        };
        tracing::info!(
            rows = df.height(),
            features = preprocessor.feature_names().len(),
            "fitted preprocessor"
        );
        Ok(preprocessor)
    }

    /// Fit on `df` and transform it.
    pub fn fit_transform(&self, df: &DataFrame) -> Result<(Preprocessor, Matrix)> {
        let preprocessor = self.fit(df)?;
        let matrix = preprocessor.transform(df)?;
        Ok((preprocessor, matrix))
    }
}

/// Fitted column transformer. Immutable once fitted.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct Preprocessor {
    one_hot: OneHotEncoder,
    ordinal: OrdinalEncoder,
    power: PowerTransformer,
    scaler: StandardScaler,
}

impl Preprocessor {
    fn branches(&self) -> [&dyn ColumnEncoder; 4] {
        [&self.one_hot, &self.ordinal, &self.power, &self.scaler]
    }

    /// Output column names, in output order.
    pub fn feature_names(&self) -> Vec<String> {
        self.branches()
            .iter()
            .flat_map(|branch| branch.feature_names())
            .collect()
    }

    /// Encode `df` into a feature matrix with one row per input row.
    pub fn transform(&self, df: &DataFrame) -> Result<Matrix> {
        let mut columns = Vec::new();
        for branch in self.branches() {
            columns.extend(branch.encode(df)?);
        }
        if columns.is_empty() {
            return Ok(Matrix::zeros(df.height(), 0));
        }
        Matrix::from_columns(&columns).ok_or_else(|| TransformError::Shape {
            message: "encoded columns have different lengths".to_string(),
        })
    }

    pub fn one_hot(&self) -> &OneHotEncoder {
        &self.one_hot
    }

    pub fn power(&self) -> &PowerTransformer {
        &self.power
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }
}
