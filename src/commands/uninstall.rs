use crate::error::{OraclientError, Result};
use crate::utils::fs;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

/// Paths ending in `.` (optionally followed by slashes): `.`, `./`, `..`, `a/.`
fn current_dir_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\./*$").expect("valid regex"))
}

/// Refuses roots that name the current (or parent) directory.
pub fn check_root(root: &Path) -> Result<()> {
    let unsafe_path = || OraclientError::UnsafePath {
        path: root.to_path_buf(),
    };

    let text = root.to_string_lossy();
    if text.trim().is_empty() || current_dir_pattern().is_match(&text) {
        return Err(unsafe_path());
    }

    if let (Ok(target), Ok(cwd)) = (root.canonicalize(), std::env::current_dir()) {
        if cwd.canonicalize().map(|cwd| cwd == target).unwrap_or(false) {
            return Err(unsafe_path());
        }
    }

    Ok(())
}

/// Removes a previous installation rooted at `root`.
pub fn uninstall(root: &Path) -> Result<()> {
    check_root(root)?;

    info!(root = %root.display(), "removing previous install");
    fs::remove_dir_recursive(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_current_directory_forms() {
        for root in [".", "./", ".//", "..", "../", "foo/.", "foo/./", ""] {
            assert!(
                matches!(
                    check_root(Path::new(root)),
                    Err(OraclientError::UnsafePath { .. })
                ),
                "{root:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejected_path_is_never_removed() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("keep");
        std::fs::create_dir_all(&marker).unwrap();

        let root = dir.path().join("keep").join(".");
        assert!(matches!(
            uninstall(&root),
            Err(OraclientError::UnsafePath { .. })
        ));
        assert!(marker.exists());
    }

    #[test]
    fn test_accepts_regular_roots() {
        for root in [".oracle", "./.oracle", "/tmp/test-oracle", "vendor/oracle"] {
            assert!(check_root(Path::new(root)).is_ok(), "{root:?} should be accepted");
        }
    }

    #[test]
    fn test_uninstall_removes_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(".oracle");
        std::fs::create_dir_all(root.join("instantclient")).unwrap();
        std::fs::write(root.join("instantclient/libclntsh.so"), b"x").unwrap();

        uninstall(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_uninstall_missing_root_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(uninstall(&dir.path().join("never-installed")).is_ok());
    }
}
