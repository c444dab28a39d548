//! Data validation stage.
//!
//! Checks the ingested train and test splits against `schema.yaml` and writes
//! a JSON report. A failed check does not raise an error: it is recorded in
//! the returned [`DataValidationArtifact`](visa_model::DataValidationArtifact)
//! and the transformation stage refuses to run.

mod error;
mod report;
mod validation;

pub use error::{Result, ValidationError};
pub use report::{DatasetReport, ValidationReport};
pub use validation::DataValidation;
