//! Mock bundle source for testing
//!
//! Serves bundles from memory and counts fetches, so tests can assert that a
//! code path never reached the network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{RepoError, Result};
use crate::fetcher::{BundleSource, validate_url};

/// In-memory bundle source
#[derive(Clone, Default)]
pub struct MockBundleSource {
    bundles: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    fetches: Arc<RwLock<Vec<String>>>,
}

impl MockBundleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`
    pub fn with_bundle(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.set_bundle(url, body);
        self
    }

    /// Replace the body served for `url`
    pub fn set_bundle(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.bundles
            .write()
            .unwrap()
            .insert(url.to_string(), body.into());
    }

    /// Number of fetch calls that got past URL validation
    pub fn fetch_count(&self) -> usize {
        self.fetches.read().unwrap().len()
    }

    /// URLs fetched, in call order
    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetches.read().unwrap().clone()
    }
}

#[async_trait]
impl BundleSource for MockBundleSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        validate_url(url)?;
        self.fetches.write().unwrap().push(url.to_string());

        self.bundles
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| RepoError::HttpError {
                status: 404,
                message: format!("Request to {} failed", url),
            })
    }
}
