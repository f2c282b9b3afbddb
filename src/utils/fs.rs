use crate::error::{OraclientError, Result};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Removes `path` and everything below it. A missing directory is not an error.
pub fn remove_dir_recursive(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed directory");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(OraclientError::filesystem(path, e)),
    }
}

/// Removes a single file. Returns whether something was removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed file");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(OraclientError::filesystem(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_dir_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/c");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("file"), b"x").unwrap();

        remove_dir_recursive(&dir.path().join("a")).unwrap();
        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn test_remove_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_dir_recursive(&dir.path().join("nothing-here")).is_ok());
    }

    #[test]
    fn test_remove_file_if_exists() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("basic.zip");
        std::fs::write(&file, b"zip").unwrap();

        assert!(remove_file_if_exists(&file).unwrap());
        assert!(!file.exists());
        assert!(!remove_file_if_exists(&file).unwrap());
    }
}
