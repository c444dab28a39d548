//! Bucket/key object storage.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, StorageError};

/// Environment variable naming the filesystem storage root.
pub const BUCKET_ROOT_ENV_VAR: &str = "VISA_BUCKET_ROOT";

/// Root used when [`BUCKET_ROOT_ENV_VAR`] is unset.
pub const DEFAULT_BUCKET_ROOT: &str = "data/buckets";

/// Minimal object storage: upload, existence check, read.
pub trait ObjectStorage: Send + Sync {
    /// Copy a local file to `bucket/key`, replacing any existing object.
    fn upload_file(&self, from_file: &Path, bucket: &str, key: &str) -> Result<()>;

    /// Whether `bucket/key` exists. Fails when the bucket itself is missing.
    fn key_exists(&self, bucket: &str, key: &str) -> Result<bool>;

    /// Full contents of `bucket/key`.
    fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
}

fn check_key(key: &str) -> Result<&Path> {
    let path = Path::new(key);
    if key.is_empty() {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "key is empty",
        });
    }
    if path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "key must be a relative path without '..'",
        });
    }
    Ok(path)
}

/// Buckets are directories under a root, keys are relative file paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root from `VISA_BUCKET_ROOT`, else [`DEFAULT_BUCKET_ROOT`].
    pub fn from_env() -> Self {
        let root = std::env::var(BUCKET_ROOT_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BUCKET_ROOT.to_string());
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        check_key(bucket).map_err(|_| StorageError::BucketNotFound {
            bucket: bucket.to_string(),
        })?;
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        Ok(self.bucket_dir(bucket)?.join(check_key(key)?))
    }
}

impl ObjectStorage for FileSystemStorage {
    fn upload_file(&self, from_file: &Path, bucket: &str, key: &str) -> Result<()> {
        let target = self.object_path(bucket, key)?;
        let bytes = fs::read(from_file).map_err(|source| StorageError::Io {
            operation: "read",
            path: from_file.to_path_buf(),
            source,
        })?;
        visa_persist::write_atomic(&target, &bytes)?;
        tracing::info!(
            bucket,
            key,
            bytes = bytes.len(),
            path = %target.display(),
            "uploaded object"
        );
        Ok(())
    }

    fn key_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let dir = self.bucket_dir(bucket)?;
        if !dir.is_dir() {
            return Err(StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            });
        }
        Ok(dir.join(check_key(key)?).is_file())
    }

    fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        if !path.is_file() {
            return Err(StorageError::KeyNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        fs::read(&path).map_err(|source| StorageError::Io {
            operation: "read",
            path,
            source,
        })
    }
}

/// Storage held in memory. Buckets must be created up front.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    buckets: Mutex<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(self, bucket: &str) -> Self {
        self.lock().entry(bucket.to_string()).or_default();
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, HashMap<String, Vec<u8>>>> {
        // A poisoned lock still holds consistent maps.
        self.buckets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ObjectStorage for InMemoryStorage {
    fn upload_file(&self, from_file: &Path, bucket: &str, key: &str) -> Result<()> {
        check_key(key)?;
        let bytes = fs::read(from_file).map_err(|source| StorageError::Io {
            operation: "read",
            path: from_file.to_path_buf(),
            source,
        })?;
        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })?;
        objects.insert(key.to_string(), bytes);
        Ok(())
    }

    fn key_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        self.lock()
            .get(bucket)
            .map(|objects| objects.contains_key(key))
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })
    }

    fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let buckets = self.lock();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::KeyNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }
}
