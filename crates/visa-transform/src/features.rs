//! Feature engineering applied before encoding.

use polars::prelude::*;
use visa_common::{column_i64, column_strings};
use visa_model::TargetValueMapping;

use crate::error::{Result, TransformError};

pub const COMPANY_AGE_COLUMN: &str = "company_age";
pub const YEAR_OF_ESTABLISHMENT_COLUMN: &str = "yr_of_estab";

/// Add `company_age = current_year - yr_of_estab`.
pub fn add_company_age(df: &mut DataFrame, current_year: i64) -> Result<()> {
    if df.column(YEAR_OF_ESTABLISHMENT_COLUMN).is_err() {
        return Err(TransformError::MissingColumn {
            column: YEAR_OF_ESTABLISHMENT_COLUMN.to_string(),
        });
    }
    let ages = column_i64(df, YEAR_OF_ESTABLISHMENT_COLUMN)?
        .into_iter()
        .enumerate()
        .map(|(row, year)| {
            year.map(|y| current_year - y)
                .ok_or_else(|| TransformError::InvalidNumeric {
                    column: YEAR_OF_ESTABLISHMENT_COLUMN.to_string(),
                    row,
                })
        })
        .collect::<Result<Vec<i64>>>()?;
    df.with_column(Series::new(COMPANY_AGE_COLUMN.into(), ages))?;
    Ok(())
}

/// Drop the listed columns. Names not present are ignored.
pub fn drop_columns(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    let mut out = df.clone();
    for name in columns {
        if out.column(name.as_str()).is_ok() {
            out = out.drop(name.as_str())?;
        }
    }
    Ok(out)
}

/// Derive `company_age` and drop the configured columns.
pub fn prepare_features(
    df: &DataFrame,
    current_year: i64,
    drop: &[String],
) -> Result<DataFrame> {
    let mut out = df.clone();
    add_company_age(&mut out, current_year)?;
    drop_columns(&out, drop)
}

/// Separate the target column and encode it with the fixed label mapping.
pub fn split_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Vec<u8>)> {
    if df.column(target).is_err() {
        return Err(TransformError::MissingColumn {
            column: target.to_string(),
        });
    }
    let mapping = TargetValueMapping;
    let labels = column_strings(df, target)?
        .into_iter()
        .map(|value| {
            let value = value.unwrap_or_default();
            mapping
                .encode(&value)
                .ok_or_else(|| TransformError::UnknownLabel {
                    column: target.to_string(),
                    value,
                })
        })
        .collect::<Result<Vec<u8>>>()?;
    Ok((df.drop(target)?, labels))
}
