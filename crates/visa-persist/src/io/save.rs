//! Object saving.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use rkyv::api::high::HighSerializer;
use rkyv::rancor;
use rkyv::ser::allocator::ArenaHandle;
use rkyv::util::AlignedVec;
use visa_model::Matrix;

use super::{CURRENT_FORMAT_VERSION, HEADER_LEN, MAGIC_BYTES};
use crate::error::{PersistError, Result};

/// Serialize `value` and write it to `path` atomically.
pub fn save_object<T>(value: &T, path: &Path) -> Result<()>
where
    T: for<'a> rkyv::Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, rancor::Error>>,
{
    let payload =
        rkyv::to_bytes::<rancor::Error>(value).map_err(|e| PersistError::Serialization {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    let mut output = Vec::with_capacity(HEADER_LEN + payload.len());
    output.extend_from_slice(&MAGIC_BYTES);
    output.extend_from_slice(&CURRENT_FORMAT_VERSION.to_le_bytes());
    output.extend_from_slice(&payload);

    write_atomic(path, &output)?;
    tracing::debug!(path = %path.display(), bytes = output.len(), "saved object");
    Ok(())
}

/// Save a numeric array.
pub fn save_array(array: &Matrix, path: &Path) -> Result<()> {
    save_object(array, path)
}

/// Write `bytes` to `path` through a synced temp file and a rename.
///
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PersistError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut temp_name = path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = std::path::PathBuf::from(temp_name);

    let mut file = File::create(&temp_path).map_err(|e| PersistError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(bytes).map_err(|e| PersistError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;

    file.sync_all().map_err(|e| PersistError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| PersistError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_array_writes_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("train.arr");

        let array = Matrix::from_rows(&[vec![1.0, 0.0], vec![2.0, 1.0]]).unwrap();
        save_array(&array, &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], &MAGIC_BYTES);
        assert_eq!(
            u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            CURRENT_FORMAT_VERSION
        );
        assert!(!dir.path().join("nested").join("train.arr.tmp").exists());
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
    }
}
