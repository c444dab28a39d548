//! Object loading.

use std::fs;
use std::path::Path;

use rkyv::api::high::{HighDeserializer, HighValidator};
use rkyv::bytecheck::CheckBytes;
use rkyv::rancor;
use rkyv::util::AlignedVec;
use visa_model::Matrix;

use super::{CURRENT_FORMAT_VERSION, HEADER_LEN, MAGIC_BYTES};
use crate::error::{PersistError, Result};

/// Read and validate an object written by [`save_object`](super::save_object).
pub fn load_object<T>(path: &Path) -> Result<T>
where
    T: rkyv::Archive,
    T::Archived: for<'a> CheckBytes<HighValidator<'a, rancor::Error>>
        + rkyv::Deserialize<T, HighDeserializer<rancor::Error>>,
{
    let bytes = fs::read(path).map_err(|e| PersistError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source: e,
    })?;
    decode_object(&bytes, path)
}

/// Decode a framed object already in memory. `origin` is used in errors.
pub fn decode_object<T>(bytes: &[u8], origin: &Path) -> Result<T>
where
    T: rkyv::Archive,
    T::Archived: for<'a> CheckBytes<HighValidator<'a, rancor::Error>>
        + rkyv::Deserialize<T, HighDeserializer<rancor::Error>>,
{
    let payload = check_header(bytes, origin)?;

    // rkyv validates alignment, and the payload sits after an 8-byte header in an
    // unaligned buffer.
    let mut aligned = AlignedVec::<16>::with_capacity(payload.len());
    aligned.extend_from_slice(payload);

    let value = rkyv::from_bytes::<T, rancor::Error>(&aligned).map_err(|e| {
        PersistError::Deserialization {
            path: origin.to_path_buf(),
            source: Box::new(e),
        }
    })?;

    tracing::debug!(path = %origin.display(), bytes = bytes.len(), "loaded object");
    Ok(value)
}

/// Load a numeric array.
pub fn load_array(path: &Path) -> Result<Matrix> {
    load_object(path)
}

fn check_header<'b>(bytes: &'b [u8], path: &Path) -> Result<&'b [u8]> {
    if bytes.len() < HEADER_LEN {
        return Err(PersistError::InvalidFormat {
            path: path.to_path_buf(),
            reason: "file too small".to_string(),
        });
    }

    if bytes[0..4] != MAGIC_BYTES {
        return Err(PersistError::InvalidFormat {
            path: path.to_path_buf(),
            reason: "invalid magic bytes".to_string(),
        });
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version > CURRENT_FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion {
            found: version,
            max_supported: CURRENT_FORMAT_VERSION,
            path: path.to_path_buf(),
        });
    }

    Ok(&bytes[HEADER_LEN..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::save::save_array;
    use tempfile::tempdir;

    #[test]
    fn test_load_array_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.arr");

        let array = Matrix::from_rows(&[vec![0.25, -1.5, 1.0], vec![3.0, 0.0, 0.0]]).unwrap();
        save_array(&array, &path).unwrap();

        assert_eq!(load_array(&path).unwrap(), array);
    }

    #[test]
    fn test_load_invalid_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.bin");
        fs::write(&path, b"NOT_A_VISA_OBJECT").unwrap();

        assert!(matches!(
            load_array(&path),
            Err(PersistError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_load_too_small() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.bin");
        fs::write(&path, b"VIS").unwrap();

        assert!(matches!(
            load_array(&path),
            Err(PersistError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_load_unsupported_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.bin");

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC_BYTES);
        bytes.extend_from_slice(&999u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 64]);
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            load_array(&path),
            Err(PersistError::UnsupportedVersion { found: 999, .. })
        ));
    }

    #[test]
    fn test_load_corrupt_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.bin");

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC_BYTES);
        bytes.extend_from_slice(&CURRENT_FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&[0xFFu8; 3]);
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            load_array(&path),
            Err(PersistError::Deserialization { .. })
        ));
    }

    #[test]
    fn test_decode_from_memory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mem.arr");
        let array = Matrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        save_array(&array, &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        let decoded: Matrix = decode_object(&bytes, Path::new("bucket/key")).unwrap();
        assert_eq!(decoded, array);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_array(Path::new("/nonexistent/model.bin")).unwrap_err();
        assert!(matches!(err, PersistError::Io { operation: "read", .. }));
        assert!(err.suggestion().is_some());
    }
}
