//! Error types for bundle fetching

use std::time::Duration;

use thiserror::Error;

/// Bundle fetch errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Input Errors ============
    #[error("Bundle URL is empty")]
    EmptyUrl,

    #[error("Invalid bundle URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}

impl RepoError {
    /// Whether the URL was missing altogether
    ///
    /// An unparseable URL is not a validation error: it is reported like any
    /// other failure to fetch.
    pub fn is_validation(&self) -> bool {
        matches!(self, RepoError::EmptyUrl)
    }
}

pub type Result<T> = std::result::Result<T, RepoError>;
