//! HTTP client abstraction so downloads can be exercised without a network.

use crate::error::{OraclientError, Result};
use std::io::Read;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// A streaming response body.
pub struct HttpResponse {
    pub body: Box<dyn Read + Send>,
    /// Size announced by the server, if any.
    pub content_length: Option<u64>,
}

/// Trait for HTTP GET requests.
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client without a total request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(None)
    }

    /// Creates a client whose requests are aborted after `timeout`,
    /// body transfer included.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("oraclient/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                OraclientError::config_error(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| OraclientError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OraclientError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(HttpResponse {
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}
