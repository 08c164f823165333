//! Atomic result saving.
//!
//! One-shot write of a finished result: stage into a temp file in the
//! destination directory, then persist under the final name. The temp file
//! is removed on every failure path, never leaked.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Failed to save output: {0}")]
    Io(#[from] std::io::Error),
}

/// Write `bytes` to `dir/name` atomically and return the final path.
pub fn save_result(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, SaveError> {
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;

    let target = dir.join(name);
    staged.persist(&target).map_err(|e| SaveError::Io(e.error))?;

    info!(path = %target.display(), size = bytes.len(), "saved output");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_save_writes_exactly_one_file() {
        let dir = tempfile::tempdir().unwrap();

        let path = save_result(dir.path(), "out.pdf", b"%PDF-1.7 data").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"%PDF-1.7 data");
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "no temp residue may remain");
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("out.pdf"), b"old").unwrap();

        let path = save_result(dir.path(), "out.pdf", b"new").unwrap();

        assert_eq!(fs::read(path).unwrap(), b"new");
    }

    #[test]
    fn test_save_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let result = save_result(&missing, "out.pdf", b"data");

        assert!(result.is_err());
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}
