//! Validation report written next to the stage artifacts.

use serde::Serialize;

/// Check results for one split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetReport {
    pub dataset: String,
    pub rows: usize,
    pub columns: usize,
    pub expected_columns: usize,
    pub column_count_ok: bool,
    pub missing_numerical_columns: Vec<String>,
    pub missing_categorical_columns: Vec<String>,
}

impl DatasetReport {
    pub fn passed(&self) -> bool {
        self.column_count_ok
            && self.missing_numerical_columns.is_empty()
            && self.missing_categorical_columns.is_empty()
    }

    /// Failure messages for this split, in check order.
    pub fn failures(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if !self.column_count_ok {
            messages.push(format!(
                "{} dataframe has {} columns, expected {}.",
                self.dataset, self.columns, self.expected_columns
            ));
        }
        if !self.missing_numerical_columns.is_empty() {
            messages.push(format!(
                "{} dataframe is missing numerical columns: {}.",
                self.dataset,
                self.missing_numerical_columns.join(", ")
            ));
        }
        if !self.missing_categorical_columns.is_empty() {
            messages.push(format!(
                "{} dataframe is missing categorical columns: {}.",
                self.dataset,
                self.missing_categorical_columns.join(", ")
            ));
        }
        messages
    }
}

/// Complete validation report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub validation_status: bool,
    pub message: String,
    pub datasets: Vec<DatasetReport>,
}

impl ValidationReport {
    pub fn from_datasets(datasets: Vec<DatasetReport>) -> Self {
        let failures: Vec<String> = datasets.iter().flat_map(DatasetReport::failures).collect();
        Self {
            validation_status: failures.is_empty(),
            message: failures.join(" "),
            datasets,
        }
    }
}
