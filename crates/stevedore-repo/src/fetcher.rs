//! HTTP bundle source
//!
//! A bundle is fetched with a single GET. The whole body is buffered in memory;
//! there is no streaming limit and no internal retry.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{RepoError, Result};

/// Something bundles can be fetched from
///
/// Implementations must be Send + Sync for use across reconcile tasks.
#[async_trait]
pub trait BundleSource: Send + Sync {
    /// Fetch the full body at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Reject empty or unparseable URLs before touching the network
pub fn validate_url(url: &str) -> Result<Url> {
    if url.trim().is_empty() {
        return Err(RepoError::EmptyUrl);
    }
    Url::parse(url).map_err(|e| RepoError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Fetches bundles over HTTP(S) with a fixed per-request deadline
pub struct HttpBundleSource {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpBundleSource {
    /// Create a source whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RepoError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_transport_error(&self, url: &str, error: reqwest::Error) -> RepoError {
        if error.is_timeout() {
            RepoError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            RepoError::NetworkError {
                message: format!("unable to get http response from {}: {}", url, error),
            }
        }
    }
}

#[async_trait]
impl BundleSource for HttpBundleSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = validate_url(url)?;

        tracing::debug!(url = %parsed, timeout = ?self.timeout, "Fetching bundle");

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.map_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepoError::HttpError {
                status: status.as_u16(),
                message: format!("Request to {} failed", url),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(url, e))?;

        tracing::debug!(url = %url, bytes = bytes.len(), "Fetched bundle");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_url() {
        assert!(matches!(validate_url(""), Err(RepoError::EmptyUrl)));
        assert!(matches!(validate_url("   "), Err(RepoError::EmptyUrl)));
    }

    #[test]
    fn test_validate_relative_url() {
        let err = validate_url("install.yaml").unwrap_err();
        assert!(matches!(err, RepoError::InvalidUrl { .. }));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validate_absolute_url() {
        let url = validate_url("https://example.com/install.yaml").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_source_keeps_timeout() {
        let source = HttpBundleSource::new(Duration::from_secs(15)).unwrap();
        assert_eq!(source.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_timeout_message_keeps_subsecond_deadline() {
        let err = RepoError::Timeout {
            url: "https://example.com/install.yaml".to_string(),
            timeout: Duration::from_millis(200),
        };
        assert_eq!(
            err.to_string(),
            "Request to https://example.com/install.yaml timed out after 200ms"
        );
    }
}
