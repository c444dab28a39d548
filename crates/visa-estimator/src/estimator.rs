//! Production model held in object storage.

use std::fs;
use std::path::Path;

use polars::prelude::DataFrame;
use tracing::{info, warn};
use visa_train::VisaModel;

use crate::error::{Result, StorageError};
use crate::storage::ObjectStorage;

/// A [`VisaModel`] stored at `bucket_name/model_path`.
///
/// The model is fetched on the first prediction and kept for the lifetime of
/// the estimator.
pub struct VisaEstimator<S: ObjectStorage> {
    bucket_name: String,
    model_path: String,
    storage: S,
    loaded_model: Option<VisaModel>,
}

impl<S: ObjectStorage> VisaEstimator<S> {
    pub fn new(bucket_name: impl Into<String>, model_path: impl Into<String>, storage: S) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            model_path: model_path.into(),
            storage,
            loaded_model: None,
        }
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_model.is_some()
    }

    /// Whether `model_path` exists in the bucket. Storage errors count as absent.
    pub fn is_model_present(&self, model_path: &str) -> bool {
        match self.storage.key_exists(&self.bucket_name, model_path) {
            Ok(present) => present,
            Err(e) => {
                warn!(
                    bucket = %self.bucket_name,
                    key = model_path,
                    error = %e,
                    "could not check for model"
                );
                false
            }
        }
    }

    /// Fetch and decode the model. Does not touch the cache.
    pub fn load_model(&self) -> Result<VisaModel> {
        let bytes = self.storage.read_object(&self.bucket_name, &self.model_path)?;
        let origin = Path::new(&self.bucket_name).join(&self.model_path);
        let model: VisaModel = visa_persist::decode_object(&bytes, &origin)?;
        info!(
            bucket = %self.bucket_name,
            key = %self.model_path,
            model = %model,
            "loaded model from storage"
        );
        Ok(model)
    }

    /// Upload `from_file` to the model key, deleting it afterwards when `remove` is set.
    pub fn save_model(&self, from_file: &Path, remove: bool) -> Result<()> {
        let hash = visa_persist::compute_file_hash(from_file)?;
        self.storage
            .upload_file(from_file, &self.bucket_name, &self.model_path)?;
        info!(
            bucket = %self.bucket_name,
            key = %self.model_path,
            sha256 = %hash,
            "pushed model"
        );
        if remove {
            fs::remove_file(from_file).map_err(|source| StorageError::Io {
                operation: "remove",
                path: from_file.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    fn model(&mut self) -> Result<&VisaModel> {
        let model = match self.loaded_model.take() {
            Some(model) => model,
            None => self.load_model()?,
        };
        Ok(self.loaded_model.insert(model))
    }

    /// Encoded class per row, loading the model on first use.
    pub fn predict(&mut self, df: &DataFrame) -> Result<Vec<u8>> {
        Ok(self.model()?.predict(df)?)
    }

    /// Like [`predict`](Self::predict), decoded to `Certified` / `Denied`.
    pub fn predict_labels(&mut self, df: &DataFrame) -> Result<Vec<&'static str>> {
        Ok(self.model()?.predict_labels(df)?)
    }
}
