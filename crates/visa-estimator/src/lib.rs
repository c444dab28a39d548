//! Storage-backed access to the production visa model.
//!
//! [`ObjectStorage`] is a bucket/key store with a filesystem backend
//! ([`FileSystemStorage`]) and an in-memory one for tests.
//! [`VisaEstimator`] pushes trained models to a bucket and serves
//! predictions from the stored copy.

mod error;
mod estimator;
mod storage;

pub use error::{Result, StorageError};
pub use estimator::VisaEstimator;
pub use storage::{
    BUCKET_ROOT_ENV_VAR, DEFAULT_BUCKET_ROOT, FileSystemStorage, InMemoryStorage, ObjectStorage,
};
