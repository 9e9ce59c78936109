//! Stevedore Repo - Bundle fetching
//!
//! Bundles are fetched with one bounded GET per attempt:
//! - `HttpBundleSource`: reqwest-backed source used by the operator
//! - `MockBundleSource`: in-memory source with fetch counting for tests

pub mod error;
pub mod fetcher;
pub mod mock;

pub use error::{RepoError, Result};
pub use fetcher::{BundleSource, HttpBundleSource, validate_url};
pub use mock::MockBundleSource;
