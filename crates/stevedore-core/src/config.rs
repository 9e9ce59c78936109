//! Installer configuration
//!
//! Built once at startup, from a YAML file or defaults, and shared read-only
//! by every reconcile.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Default deadline for fetching a bundle
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Default delay before a failed Installation is retried
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallerConfig {
    /// Deadline for a single bundle GET
    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub fetch_timeout: Duration,

    /// Requeue delay after a failed attempt
    #[serde(default = "default_retry_interval", with = "humantime_serde")]
    pub retry_interval: Duration,

    /// Overlay (kustomize) path settings
    #[serde(default)]
    pub overlay: OverlayConfig,
}

fn default_fetch_timeout() -> Duration {
    DEFAULT_FETCH_TIMEOUT
}

fn default_retry_interval() -> Duration {
    DEFAULT_RETRY_INTERVAL
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            overlay: OverlayConfig::default(),
        }
    }
}

impl InstallerConfig {
    /// Load configuration from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }
}

/// Settings for rendering and applying overlay bundles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Executable used as `<binary> build <dir>`
    #[serde(default = "default_kustomize_binary")]
    pub kustomize_binary: PathBuf,

    /// Cluster API path every rendered document is POSTed to
    #[serde(default = "default_post_path")]
    pub post_path: String,

    /// Treat `AlreadyExists` on POST as success
    #[serde(default = "default_tolerate_existing")]
    pub tolerate_existing: bool,
}

fn default_kustomize_binary() -> PathBuf {
    PathBuf::from("kustomize")
}

fn default_post_path() -> String {
    "/api/v1".to_string()
}

fn default_tolerate_existing() -> bool {
    true
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            kustomize_binary: default_kustomize_binary(),
            post_path: default_post_path(),
            tolerate_existing: default_tolerate_existing(),
        }
    }
}
