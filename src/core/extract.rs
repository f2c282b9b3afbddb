use crate::error::{OraclientError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Extraction that stopped midway: the paths written before the failure,
/// and the failure itself. Nothing already written is removed.
#[derive(Debug)]
pub struct PartialExtraction {
    pub written: Vec<PathBuf>,
    pub error: OraclientError,
}

impl From<PartialExtraction> for OraclientError {
    fn from(partial: PartialExtraction) -> Self {
        partial.error
    }
}

/// Extracts the zip archive at `src` into the parent directory of
/// `destination_hint`, returning every path created, in archive order.
///
/// An entry whose path would land outside that directory aborts the
/// extraction with `IllegalPath` before anything is written for it.
pub fn unzip(
    src: &Path,
    destination_hint: &Path,
) -> std::result::Result<Vec<PathBuf>, PartialExtraction> {
    let mut written = Vec::new();
    match extract_into(src, &destination_root(destination_hint), &mut written) {
        Ok(()) => Ok(written),
        Err(error) => Err(PartialExtraction { written, error }),
    }
}

fn destination_root(hint: &Path) -> PathBuf {
    match hint.parent() {
        Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
        Some(parent) => parent.to_path_buf(),
        None => hint.to_path_buf(),
    }
}

fn extract_into(src: &Path, root: &Path, written: &mut Vec<PathBuf>) -> Result<()> {
    let file = File::open(src).map_err(|e| OraclientError::filesystem(src, e))?;
    let mut archive = ZipArchive::new(file)?;
    debug!(archive = %src.display(), root = %root.display(), entries = archive.len(), "extracting");

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let outpath = match entry.enclosed_name() {
            Some(relative) => root.join(relative),
            None => {
                return Err(OraclientError::IllegalPath {
                    path: root.join(entry.name()),
                })
            }
        };
        if !is_contained(root, &outpath) {
            return Err(OraclientError::IllegalPath { path: outpath });
        }

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)
                .map_err(|e| OraclientError::filesystem(&outpath, e))?;
            written.push(outpath);
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OraclientError::filesystem(parent, e))?;
        }

        let mut outfile =
            File::create(&outpath).map_err(|e| OraclientError::filesystem(&outpath, e))?;
        std::io::copy(&mut entry, &mut outfile)
            .map_err(|e| OraclientError::filesystem(&outpath, e))?;
        drop(outfile);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode().map(|m| m & 0o777).filter(|m| *m != 0) {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))
                    .map_err(|e| OraclientError::filesystem(&outpath, e))?;
            }
        }

        written.push(outpath);
    }

    Ok(())
}

/// `path` must sit strictly below `root`.
fn is_contained(root: &Path, path: &Path) -> bool {
    path.starts_with(root) && path.components().count() > root.components().count()
}
