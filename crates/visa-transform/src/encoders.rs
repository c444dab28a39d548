//! Fitted column encoders.
//!
//! Every encoder is fitted on the training frame only and then applied
//! unchanged to any other frame. Each one reads its columns by name and emits
//! output columns in a fixed order.

use std::collections::BTreeSet;

use polars::prelude::DataFrame;
use rkyv::{Archive, Deserialize, Serialize};
use visa_common::{column_f64, column_strings};

use crate::error::{Result, TransformError};

/// Common surface of the fitted encoders.
pub trait ColumnEncoder {
    /// Names of the produced columns.
    fn feature_names(&self) -> Vec<String>;

    /// Encode `df`, returning one vector per output column.
    fn encode(&self, df: &DataFrame) -> Result<Vec<Vec<f64>>>;
}

fn require_column(df: &DataFrame, name: &str) -> Result<()> {
    if df.column(name).is_err() {
        return Err(TransformError::MissingColumn {
            column: name.to_string(),
        });
    }
    Ok(())
}

/// Read a categorical column. Nulls are rejected.
pub(crate) fn categorical_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    require_column(df, name)?;
    column_strings(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| TransformError::NullCategory {
                column: name.to_string(),
                row,
            })
        })
        .collect()
}

/// Read a numeric column. Nulls and unparseable strings are rejected.
pub(crate) fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    require_column(df, name)?;
    column_f64(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value
                .filter(|v| v.is_finite())
                .ok_or_else(|| TransformError::InvalidNumeric {
                    column: name.to_string(),
                    row,
                })
        })
        .collect()
}

fn sorted_categories(values: &[String]) -> Vec<String> {
    values
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn category_index(categories: &[String], column: &str, value: &str) -> Result<usize> {
    categories
        .binary_search_by(|c| c.as_str().cmp(value))
        .map_err(|_| TransformError::UnknownCategory {
            column: column.to_string(),
            value: value.to_string(),
        })
}

/// Population mean and standard deviation. A zero deviation becomes 1.
fn mean_and_scale(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std = var.sqrt();
    let scale = if std > f64::EPSILON * mean.abs().max(1.0) {
        std
    } else {
        1.0
    };
    (mean, scale)
}

/// One indicator column per category, categories sorted ascending.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    pub fn fit(df: &DataFrame, columns: &[String]) -> Result<Self> {
        let categories = columns
            .iter()
            .map(|column| Ok(sorted_categories(&categorical_column(df, column)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            columns: columns.to_vec(),
            categories,
        })
    }

    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }
}

impl ColumnEncoder for OneHotEncoder {
    fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(column, cats)| cats.iter().map(move |c| format!("{column}_{c}")))
            .collect()
    }

    fn encode(&self, df: &DataFrame) -> Result<Vec<Vec<f64>>> {
        let mut out = Vec::new();
        for (column, cats) in self.columns.iter().zip(&self.categories) {
            let values = categorical_column(df, column)?;
            let mut block = vec![vec![0.0; values.len()]; cats.len()];
            for (row, value) in values.iter().enumerate() {
                let idx = category_index(cats, column, value)?;
                block[idx][row] = 1.0;
            }
            out.extend(block);
        }
        Ok(out)
    }
}

/// Integer code per category, categories sorted ascending.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    columns: Vec<String>,
    categories: Vec<Vec<String>>,
}

impl OrdinalEncoder {
    pub fn fit(df: &DataFrame, columns: &[String]) -> Result<Self> {
        let categories = columns
            .iter()
            .map(|column| Ok(sorted_categories(&categorical_column(df, column)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            columns: columns.to_vec(),
            categories,
        })
    }

    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }
}

impl ColumnEncoder for OrdinalEncoder {
    fn feature_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn encode(&self, df: &DataFrame) -> Result<Vec<Vec<f64>>> {
        self.columns
            .iter()
            .zip(&self.categories)
            .map(|(column, cats)| {
                categorical_column(df, column)?
                    .iter()
                    .map(|value| category_index(cats, column, value).map(|i| i as f64))
                    .collect()
            })
            .collect()
    }
}

/// Yeo-Johnson transform of a single value.
pub fn yeo_johnson(x: f64, lambda: f64) -> f64 {
    const EPS: f64 = 1e-8;
    if x >= 0.0 {
        if lambda.abs() < EPS {
            x.ln_1p()
        } else {
            ((x + 1.0).powf(lambda) - 1.0) / lambda
        }
    } else if (lambda - 2.0).abs() < EPS {
        -(-x).ln_1p()
    } else {
        -((1.0 - x).powf(2.0 - lambda) - 1.0) / (2.0 - lambda)
    }
}

/// Profile log-likelihood of `lambda` for the Yeo-Johnson transform.
fn yeo_johnson_log_likelihood(values: &[f64], lambda: f64) -> f64 {
    let n = values.len() as f64;
    let transformed: Vec<f64> = values.iter().map(|&x| yeo_johnson(x, lambda)).collect();
    let mean = transformed.iter().sum::<f64>() / n;
    let var = transformed.iter().map(|t| (t - mean) * (t - mean)).sum::<f64>() / n;
    let jacobian: f64 = values.iter().map(|&x| x.signum() * x.abs().ln_1p()).sum();
    let llf = -n / 2.0 * var.ln() + (lambda - 1.0) * jacobian;
    if llf.is_finite() { llf } else { f64::NEG_INFINITY }
}

const LAMBDA_BOUNDS: (f64, f64) = (-5.0, 5.0);

/// Maximise a unimodal function on `[lo, hi]` by golden-section search.
fn golden_section_max(f: impl Fn(f64) -> f64, lo: f64, hi: f64, tol: f64) -> f64 {
    let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = (lo, hi);
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);
    while b - a > tol {
        if fc > fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = f(d);
        }
    }
    (a + b) / 2.0
}

/// Maximum-likelihood Yeo-Johnson lambda for `values`.
///
/// Constant columns get `lambda = 1`, the identity.
pub fn fit_lambda(values: &[f64]) -> f64 {
    let first = values.first().copied().unwrap_or_default();
    if values.iter().all(|v| *v == first) {
        return 1.0;
    }
    golden_section_max(
        |lambda| yeo_johnson_log_likelihood(values, lambda),
        LAMBDA_BOUNDS.0,
        LAMBDA_BOUNDS.1,
        1e-6,
    )
}

/// Yeo-Johnson power transform followed by standardisation.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct PowerTransformer {
    columns: Vec<String>,
    lambdas: Vec<f64>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl PowerTransformer {
    pub fn fit(df: &DataFrame, columns: &[String]) -> Result<Self> {
        let mut lambdas = Vec::with_capacity(columns.len());
        let mut means = Vec::with_capacity(columns.len());
        let mut scales = Vec::with_capacity(columns.len());
        for column in columns {
            let values = numeric_column(df, column)?;
            let lambda = fit_lambda(&values);
            let transformed: Vec<f64> = values.iter().map(|&x| yeo_johnson(x, lambda)).collect();
            let (mean, scale) = mean_and_scale(&transformed);
            tracing::debug!(column = %column, lambda, "fitted power transform");
            lambdas.push(lambda);
            means.push(mean);
            scales.push(scale);
        }
        Ok(Self {
            columns: columns.to_vec(),
            lambdas,
            means,
            scales,
        })
    }

    pub fn lambdas(&self) -> &[f64] {
        &self.lambdas
    }
}

impl ColumnEncoder for PowerTransformer {
    fn feature_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn encode(&self, df: &DataFrame) -> Result<Vec<Vec<f64>>> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let values = numeric_column(df, column)?;
                Ok(values
                    .iter()
                    .map(|&x| (yeo_johnson(x, self.lambdas[i]) - self.means[i]) / self.scales[i])
                    .collect())
            })
            .collect()
    }
}

/// Zero-mean, unit-variance scaling with population statistics.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(df: &DataFrame, columns: &[String]) -> Result<Self> {
        let mut means = Vec::with_capacity(columns.len());
        let mut scales = Vec::with_capacity(columns.len());
        for column in columns {
            let (mean, scale) = mean_and_scale(&numeric_column(df, column)?);
            means.push(mean);
            scales.push(scale);
        }
        Ok(Self {
            columns: columns.to_vec(),
            means,
            scales,
        })
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }
}

impl ColumnEncoder for StandardScaler {
    fn feature_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn encode(&self, df: &DataFrame) -> Result<Vec<Vec<f64>>> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let values = numeric_column(df, column)?;
                Ok(values
                    .iter()
                    .map(|&x| (x - self.means[i]) / self.scales[i])
                    .collect())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::Column;
    use proptest::prelude::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("continent".into(), vec!["Europe", "Asia", "Europe", "Africa"]),
            Column::new(
                "education_of_employee".into(),
                vec!["Master's", "Bachelor's", "Doctorate", "Master's"],
            ),
            Column::new("prevailing_wage".into(), vec![10.0, 20.0, 30.0, 40.0]),
            Column::new("no_of_employees".into(), vec![14513i64, 2412, 44444, 98]),
        ])
        .unwrap()
    }

    #[test]
    fn test_one_hot_sorted_categories() {
        let df = frame();
        let enc = OneHotEncoder::fit(&df, &cols(&["continent"])).unwrap();
        assert_eq!(enc.categories()[0], vec!["Africa", "Asia", "Europe"]);
        assert_eq!(
            enc.feature_names(),
            vec!["continent_Africa", "continent_Asia", "continent_Europe"]
        );
        let out = enc.encode(&df).unwrap();
        assert_eq!(out[0], vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(out[1], vec![0.0, 1.0, 0.0, 0.0]);
        assert_eq!(out[2], vec![1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_one_hot_unknown_category() {
        let enc = OneHotEncoder::fit(&frame(), &cols(&["continent"])).unwrap();
        let other =
            DataFrame::new(vec![Column::new("continent".into(), vec!["Oceania"])]).unwrap();
        assert!(matches!(
            enc.encode(&other),
            Err(TransformError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_ordinal_codes() {
        let df = frame();
        let enc = OrdinalEncoder::fit(&df, &cols(&["education_of_employee"])).unwrap();
        assert_eq!(enc.encode(&df).unwrap()[0], vec![2.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_missing_column_at_fit() {
        assert!(matches!(
            StandardScaler::fit(&frame(), &cols(&["company_age"])),
            Err(TransformError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_standard_scaler() {
        let df = frame();
        let scaler = StandardScaler::fit(&df, &cols(&["prevailing_wage"])).unwrap();
        assert_eq!(scaler.means(), &[25.0]);
        let out = &scaler.encode(&df).unwrap()[0];
        let mean: f64 = out.iter().sum::<f64>() / 4.0;
        let var: f64 = out.iter().map(|v| v * v).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_scales_by_one() {
        let df = DataFrame::new(vec![Column::new("x".into(), vec![3.0, 3.0, 3.0])]).unwrap();
        let scaler = StandardScaler::fit(&df, &cols(&["x"])).unwrap();
        assert_eq!(scaler.scales(), &[1.0]);
        assert_eq!(scaler.encode(&df).unwrap()[0], vec![0.0, 0.0, 0.0]);

        let power = PowerTransformer::fit(&df, &cols(&["x"])).unwrap();
        assert_eq!(power.lambdas(), &[1.0]);
    }

    #[test]
    fn test_invalid_numeric() {
        let df = DataFrame::new(vec![Column::new("x".into(), vec![Some(1.0), None])]).unwrap();
        assert!(matches!(
            StandardScaler::fit(&df, &cols(&["x"])),
            Err(TransformError::InvalidNumeric { row: 1, .. })
        ));
    }

    #[test]
    fn test_yeo_johnson_branches() {
        assert!((yeo_johnson(3.0, 1.0) - 3.0).abs() < 1e-12);
        assert!((yeo_johnson(-3.0, 1.0) + 3.0).abs() < 1e-12);
        assert!((yeo_johnson(1.0, 0.0) - 2f64.ln()).abs() < 1e-12);
        assert!((yeo_johnson(-1.0, 2.0) + 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_skewed_column_gets_small_lambda() {
        let values: Vec<f64> = (1..200).map(|i| f64::from(i).powi(3)).collect();
        let lambda = fit_lambda(&values);
        assert!(lambda < 1.0, "lambda {lambda} should compress a right skew");
        assert!(lambda > LAMBDA_BOUNDS.0 && lambda < LAMBDA_BOUNDS.1);
    }

    #[test]
    fn test_power_transform_standardized() {
        let df = frame();
        let power = PowerTransformer::fit(&df, &cols(&["no_of_employees"])).unwrap();
        let out = &power.encode(&df).unwrap()[0];
        let mean: f64 = out.iter().sum::<f64>() / out.len() as f64;
        assert!(mean.abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_yeo_johnson_is_monotonic(
            lambda in -5.0f64..5.0,
            a in -1000.0f64..1000.0,
            b in -1000.0f64..1000.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(yeo_johnson(lo, lambda) <= yeo_johnson(hi, lambda));
        }

        #[test]
        fn prop_fitted_lambda_within_bounds(values in prop::collection::vec(-100.0f64..1e5, 3..50)) {
            let lambda = fit_lambda(&values);
            prop_assert!((LAMBDA_BOUNDS.0..=LAMBDA_BOUNDS.1).contains(&lambda));
        }
    }
}
