//! SHA-256 digests of saved artifacts.

use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{PersistError, Result};

/// Hex-encoded SHA-256 of a file, streamed so large models are not buffered.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let read_error = |source| PersistError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(read_error)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(read_error)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        std::fs::write(&path, b"Hello, World!").unwrap();

        assert_eq!(
            compute_file_hash(&path).unwrap(),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn test_digest_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        std::fs::write(&path, b"model v1").unwrap();
        let first = compute_file_hash(&path).unwrap();
        std::fs::write(&path, b"model v2").unwrap();

        assert_ne!(compute_file_hash(&path).unwrap(), first);
        assert!(compute_file_hash(&dir.path().join("absent.bin")).is_err());
    }
}
