use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OraclientError>;

#[derive(Error, Debug)]
pub enum OraclientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Refusing to operate on '{path}': current directory is not allowed")]
    UnsafePath { path: PathBuf },

    #[error("Unsupported OS: {os}")]
    UnsupportedPlatform { os: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid download URL: {url}")]
    InvalidUrl { url: String },

    #[error("Download failed: {url}: {message}")]
    Network { url: String, message: String },

    #[error("Download failed: HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("{path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("{path}: illegal file path")]
    IllegalPath { path: PathBuf },

    #[error("instantclient not found in {root}")]
    InstantClientNotFound { root: PathBuf },

    #[error("Multiple instantclient directories in {root}: {}", .candidates.join(", "))]
    AmbiguousInstantClient {
        root: PathBuf,
        candidates: Vec<String>,
    },

    #[error("Task '{task}' panicked")]
    TaskPanicked { task: String },

    #[error("{} errors occurred: {}", .0.len(), join_messages(.0))]
    Multiple(Vec<OraclientError>),
}

fn join_messages(errors: &[OraclientError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl OraclientError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        OraclientError::Config {
            message: message.into(),
        }
    }

    /// Attaches the offending path to an I/O error.
    pub fn filesystem<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        OraclientError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Collapses a list of errors: a single error is returned as is, several
    /// are wrapped in `Multiple`. Returns `None` for an empty list.
    pub fn aggregate(mut errors: Vec<OraclientError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(OraclientError::Multiple(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_empty() {
        assert!(OraclientError::aggregate(Vec::new()).is_none());
    }

    #[test]
    fn test_aggregate_single_is_unwrapped() {
        let err = OraclientError::aggregate(vec![OraclientError::UnsupportedPlatform {
            os: "plan9".to_string(),
        }])
        .unwrap();
        assert!(matches!(err, OraclientError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn test_aggregate_many_keeps_all() {
        let err = OraclientError::aggregate(vec![
            OraclientError::HttpStatus {
                url: "http://a/basic.zip".to_string(),
                status: 404,
            },
            OraclientError::InvalidUrl {
                url: "nope".to_string(),
            },
        ])
        .unwrap();

        match &err {
            OraclientError::Multiple(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.starts_with("2 errors occurred"));
        assert!(message.contains("HTTP 404"));
        assert!(message.contains("nope"));
    }
}
