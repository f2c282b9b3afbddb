use crate::error::{OraclientError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const BASE_DOWNLOAD: &str =
    "https://github.com/shenron/docker-node/raw/master/oracle_client/conf/oracle/";

/// Platforms the archive table knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Platform {
    Linux,
    Macos,
}

impl Platform {
    /// Detects the host platform.
    pub fn current() -> Result<Self> {
        std::env::consts::OS.parse()
    }
}

impl FromStr for Platform {
    type Err = OraclientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linux" => Ok(Platform::Linux),
            "macos" | "darwin" => Ok(Platform::Macos),
            other => Err(OraclientError::UnsupportedPlatform {
                os: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::Macos => write!(f, "macos"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ArchivePair {
    pub basic: String,
    pub sdk: String,
}

/// Archive file names per platform, served under a common base URL.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlatformTable {
    pub base_url: String,
    #[serde(default)]
    pub linux: Option<ArchivePair>,
    #[serde(default)]
    pub macos: Option<ArchivePair>,
}

impl Default for PlatformTable {
    fn default() -> Self {
        PlatformTable {
            base_url: BASE_DOWNLOAD.to_string(),
            linux: Some(ArchivePair {
                basic: "instantclient-basiclite-linux.x64-19.3.0.0.0dbru.zip".to_string(),
                sdk: "instantclient-sdk-linux.x64-19.3.0.0.0dbru.zip".to_string(),
            }),
            macos: Some(ArchivePair {
                basic: "instantclient-basiclite-macos.x64-18.1.0.0.0.zip".to_string(),
                sdk: "instantclient-sdk-macos.x64-18.1.0.0.0-2.zip".to_string(),
            }),
        }
    }
}

impl PlatformTable {
    /// Reads a JSON table, typically pointing at a mirror.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| OraclientError::filesystem(path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            OraclientError::config_error(format!("{}: {e}", path.display()))
        })
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn archives(&self, platform: Platform) -> Option<&ArchivePair> {
        match platform {
            Platform::Linux => self.linux.as_ref(),
            Platform::Macos => self.macos.as_ref(),
        }
    }

    /// Resolves the two download URLs for `platform`.
    pub fn resolve(&self, platform: Platform) -> Result<InstallConfig> {
        let pair = self
            .archives(platform)
            .ok_or_else(|| OraclientError::UnsupportedPlatform {
                os: platform.to_string(),
            })?;

        Ok(InstallConfig {
            basic_archive_url: self.url_for(&pair.basic),
            sdk_archive_url: self.url_for(&pair.sdk),
        })
    }

    fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), file_name)
    }
}

/// The two archive URLs for one install run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    pub basic_archive_url: String,
    pub sdk_archive_url: String,
}
