use crate::core::http::HttpClient;
use crate::core::progress::{ProgressCounter, ProgressReader};
use crate::error::{OraclientError, Result};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One archive to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub target_filename: PathBuf,
    pub source_url: String,
    pub progress_label: String,
}

impl DownloadTask {
    /// Names the target after the last path segment of `url`, inside `work_dir`.
    pub fn from_url(work_dir: &Path, url: &str, label: &str) -> Result<Self> {
        let file_name = archive_file_name(url)?;
        Ok(Self {
            target_filename: work_dir.join(file_name),
            source_url: url.to_string(),
            progress_label: label.to_string(),
        })
    }

    pub fn run(&self, client: &dyn HttpClient, counter: &mut ProgressCounter) -> Result<()> {
        download_file(client, &self.target_filename, &self.source_url, counter)
    }
}

fn archive_file_name(url: &str) -> Result<String> {
    let invalid = || OraclientError::InvalidUrl {
        url: url.to_string(),
    };

    let parsed = reqwest::Url::parse(url).map_err(|_| invalid())?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
        .ok_or_else(invalid)
}

/// Path the body is streamed to before it is promoted to `destination`.
pub fn temp_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Streams `url` into `destination`.
///
/// The body is written to `<destination>.tmp` and renamed once the transfer
/// is complete, so `destination` only ever holds a full download. On failure
/// the temporary file is left in place.
pub fn download_file(
    client: &dyn HttpClient,
    destination: &Path,
    url: &str,
    counter: &mut ProgressCounter,
) -> Result<()> {
    let tmp = temp_path(destination);
    debug!(url, tmp = %tmp.display(), "starting download");

    let file = File::create(&tmp).map_err(|e| OraclientError::filesystem(&tmp, e))?;
    let mut out = BufWriter::new(file);

    let response = client.get(url)?;
    if let Some(length) = response.content_length {
        counter.set_length(length);
    }

    let copied = {
        let mut reader = ProgressReader::new(response.body, counter);
        std::io::copy(&mut reader, &mut out)
    };
    if let Err(e) = copied {
        counter.abandon();
        return Err(OraclientError::Network {
            url: url.to_string(),
            message: e.to_string(),
        });
    }

    // Flush and close before the rename.
    out.flush().map_err(|e| OraclientError::filesystem(&tmp, e))?;
    drop(out);
    counter.finish();

    std::fs::rename(&tmp, destination).map_err(|e| OraclientError::filesystem(&tmp, e))?;
    debug!(url, destination = %destination.display(), bytes = counter.total(), "download complete");
    Ok(())
}
