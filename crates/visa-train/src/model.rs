//! The deployable predictor: fitted preprocessor plus fitted classifier.

use std::fmt;
use std::path::Path;

use polars::prelude::DataFrame;
use rkyv::{Archive, Deserialize, Serialize};
use visa_model::TargetValueMapping;
use visa_transform::Preprocessor;

use crate::classifier::{Classifier, Predictor};
use crate::error::{Result, TrainError};

/// Fitted preprocessor and classifier, persisted as one object.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct VisaModel {
    preprocessing_object: Preprocessor,
    trained_model_object: Classifier,
}

impl VisaModel {
    pub fn new(preprocessing_object: Preprocessor, trained_model_object: Classifier) -> Self {
        Self {
            preprocessing_object,
            trained_model_object,
        }
    }

    /// Encode `df` with the stored preprocessor and classify every row.
    ///
    /// `df` must already carry the engineered features the preprocessor was
    /// fitted on.
    pub fn predict(&self, df: &DataFrame) -> Result<Vec<u8>> {
        let features = self.preprocessing_object.transform(df)?;
        Ok(self.trained_model_object.predict(&features))
    }

    /// Like [`predict`](Self::predict), decoded to `Certified` / `Denied`.
    pub fn predict_labels(&self, df: &DataFrame) -> Result<Vec<&'static str>> {
        let labels = TargetValueMapping.reverse_mapping();
        self.predict(df)?
            .into_iter()
            .map(|code| {
                labels
                    .iter()
                    .find_map(|&(known, label)| (known == code).then_some(label))
                    .ok_or_else(|| TrainError::invalid_data(format!("unknown class code {code}")))
            })
            .collect()
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessing_object
    }

    pub fn classifier(&self) -> &Classifier {
        &self.trained_model_object
    }

    pub fn model_name(&self) -> &'static str {
        self.trained_model_object.name()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        visa_persist::save_object(self, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(visa_persist::load_object(path)?)
    }
}

impl fmt::Display for VisaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.model_name())
    }
}
