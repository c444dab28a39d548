//! Batch prediction over a CSV of visa applications.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use polars::prelude::{DataFrame, NamedFrom, Series};
use visa_ingest::{read_csv_table, write_csv_table};
use visa_model::SchemaConfig;
use visa_transform::prepare_features;

/// Column appended to the input rows.
pub const PREDICTION_COLUMN: &str = "prediction";

/// Raw input rows and the engineered features derived from them.
#[derive(Debug)]
pub struct PredictionInput {
    pub raw: DataFrame,
    pub features: DataFrame,
}

/// Read `input` and derive the features the preprocessor expects.
///
/// Applies the same `company_age` derivation and column drops as training.
pub fn load_prediction_input(
    input: &Path,
    schema_file: &Path,
    current_year: i64,
) -> Result<PredictionInput> {
    let schema = SchemaConfig::load(schema_file)
        .with_context(|| format!("load schema {}", schema_file.display()))?;
    let raw = read_csv_table(input).with_context(|| format!("read {}", input.display()))?;
    if raw.height() == 0 {
        bail!("{} has no rows", input.display());
    }
    let features = prepare_features(&raw, current_year, &schema.drop_columns)
        .context("prepare features")?;
    Ok(PredictionInput { raw, features })
}

/// `input` with a `prediction` column holding one label per row.
pub fn annotate_predictions(input: &DataFrame, labels: &[&str]) -> Result<DataFrame> {
    if labels.len() != input.height() {
        bail!(
            "got {} predictions for {} rows",
            labels.len(),
            input.height()
        );
    }
    let mut out = input.clone();
    if out.column(PREDICTION_COLUMN).is_ok() {
        out = out.drop(PREDICTION_COLUMN)?;
    }
    out.with_column(Series::new(PREDICTION_COLUMN.into(), labels))?;
    Ok(out)
}

/// `<stem>_predictions.csv` next to `input`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    input.with_file_name(format!("{stem}_predictions.csv"))
}

/// Write the annotated rows as CSV.
pub fn write_predictions(df: &mut DataFrame, output: &Path) -> Result<()> {
    write_csv_table(df, output).with_context(|| format!("write {}", output.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::Column;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("data/new_cases.csv")),
            PathBuf::from("data/new_cases_predictions.csv")
        );
    }

    #[test]
    fn test_annotate_replaces_existing_column() {
        let df = DataFrame::new(vec![
            Column::new("case_id".into(), ["EZYV1", "EZYV2"]),
            Column::new(PREDICTION_COLUMN.into(), ["x", "y"]),
        ])
        .unwrap();
        let out = annotate_predictions(&df, &["Denied", "Certified"]).unwrap();
        assert_eq!(out.width(), 2);
        let values: Vec<Option<&str>> = out
            .column(PREDICTION_COLUMN)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some("Denied"), Some("Certified")]);
    }

    #[test]
    fn test_annotate_rejects_length_mismatch() {
        let df = DataFrame::new(vec![Column::new("case_id".into(), ["EZYV1"])]).unwrap();
        assert!(annotate_predictions(&df, &[]).is_err());
    }
}
