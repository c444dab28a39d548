//! Column readers over Polars frames.
//!
//! Document stores and CSV files disagree on cell types (a year may arrive as
//! `Int64`, `Float64` or a string), so the readers coerce per cell instead of
//! relying on the column dtype.

use polars::prelude::*;

/// Reads a column as optional strings, one entry per row.
///
/// Whole floats render without a fractional part (`2010.0` becomes `2010`)
/// and booleans render as `Y`/`N`, the spelling the visa dataset uses for its
/// yes/no columns.
///
/// # Examples
///
/// ```
/// use polars::prelude::*;
/// use visa_common::column_strings;
///
/// let df = df!("has_job_experience" => [Some(true), None]).unwrap();
/// assert_eq!(
///     column_strings(&df, "has_job_experience").unwrap(),
///     vec![Some("Y".to_string()), None]
/// );
/// ```
pub fn column_strings(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    read_cells(df, name, |value| {
        if value.is_null() {
            None
        } else {
            Some(cell_text(value))
        }
    })
}

/// Reads a column as optional floats. Unparseable text becomes `None`.
pub fn column_f64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    read_cells(df, name, cell_f64)
}

/// Reads a column as optional integers. Floats are truncated.
pub fn column_i64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    read_cells(df, name, cell_i64)
}

fn read_cells<T>(
    df: &DataFrame,
    name: &str,
    convert: impl Fn(AnyValue<'_>) -> Option<T>,
) -> PolarsResult<Vec<Option<T>>> {
    let column = df.column(name)?;
    (0..df.height())
        .map(|idx| column.get(idx).map(&convert))
        .collect()
}

fn cell_text(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Float32(v) => trim_float(f64::from(v)),
        AnyValue::Float64(v) => trim_float(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => if b { "Y" } else { "N" }.to_string(),
        other => other.to_string(),
    }
}

fn trim_float(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let text = v.to_string();
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

fn cell_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::String(s) => s.trim().parse().ok(),
        AnyValue::StringOwned(s) => s.trim().parse().ok(),
        AnyValue::Boolean(_) | AnyValue::Null => None,
        other => other.extract::<f64>(),
    }
}

fn cell_i64(value: AnyValue<'_>) -> Option<i64> {
    match value {
        AnyValue::Float32(v) => Some(v as i64),
        AnyValue::Float64(v) => Some(v as i64),
        AnyValue::String(s) => s.trim().parse().ok(),
        AnyValue::StringOwned(s) => s.trim().parse().ok(),
        AnyValue::Boolean(_) | AnyValue::Null => None,
        other => other.extract::<i64>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(AnyValue::Null), "");
        assert_eq!(cell_text(AnyValue::Int64(-100)), "-100");
        assert_eq!(cell_text(AnyValue::Float64(1.5)), "1.5");
        assert_eq!(cell_text(AnyValue::Float64(2010.0)), "2010");
        assert_eq!(cell_text(AnyValue::Float64(-0.0)), "0");
        assert_eq!(cell_text(AnyValue::Boolean(false)), "N");
    }

    #[test]
    fn test_numeric_cells() {
        assert_eq!(cell_f64(AnyValue::Int32(42)), Some(42.0));
        assert_eq!(cell_f64(AnyValue::String(" 2.5 ")), Some(2.5));
        assert_eq!(cell_f64(AnyValue::String("n/a")), None);
        assert_eq!(cell_i64(AnyValue::Float64(3.9)), Some(3));
        assert_eq!(cell_i64(AnyValue::String("2007")), Some(2007));
        assert_eq!(cell_i64(AnyValue::Null), None);
    }

    #[test]
    fn test_column_readers() {
        let df = DataFrame::new(vec![
            Series::new("yr_of_estab".into(), &[Some(2007i64), None]).into(),
            Series::new("region".into(), &[Some("West"), None]).into(),
        ])
        .unwrap();

        assert_eq!(column_i64(&df, "yr_of_estab").unwrap(), vec![Some(2007), None]);
        assert_eq!(
            column_f64(&df, "yr_of_estab").unwrap(),
            vec![Some(2007.0), None]
        );
        assert_eq!(
            column_strings(&df, "region").unwrap(),
            vec![Some("West".to_string()), None]
        );
        assert!(column_strings(&df, "missing").is_err());
    }
}
