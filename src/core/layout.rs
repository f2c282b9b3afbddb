use crate::error::{OraclientError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Final name of the extracted client directory.
pub const INSTANT_CLIENT_DIR: &str = "instantclient";

fn versioned_dir_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^instantclient_\S+$").expect("valid regex"))
}

/// Finds the single `instantclient_<version>` directory directly under `root`.
pub fn find_instant_client_path(root: &Path) -> Result<String> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(OraclientError::InstantClientNotFound {
                root: root.to_path_buf(),
            })
        }
        Err(e) => return Err(OraclientError::filesystem(root, e)),
    };

    let mut candidates: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().to_str().map(|s| s.to_string()))
        .filter(|name| versioned_dir_pattern().is_match(name))
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(OraclientError::InstantClientNotFound {
            root: root.to_path_buf(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(OraclientError::AmbiguousInstantClient {
            root: root.to_path_buf(),
            candidates,
        }),
    }
}

/// Renames `root/instantclient_<version>` to `root/instantclient`.
pub fn normalize_install_dir(root: &Path) -> Result<PathBuf> {
    let found = find_instant_client_path(root)?;
    let from = root.join(&found);
    let to = root.join(INSTANT_CLIENT_DIR);

    debug!(from = %from.display(), to = %to.display(), "renaming client directory");
    std::fs::rename(&from, &to).map_err(|e| OraclientError::filesystem(&from, e))?;
    Ok(to)
}
