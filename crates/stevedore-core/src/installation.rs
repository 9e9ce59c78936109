//! The `Installation` custom resource
//!
//! An Installation points at a remote bundle of Kubernetes declarations and
//! records, in its status, how far the last attempt to install it got.

use std::fmt;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Sentinel for `status.total` before any attempt has drained a bundle
pub const TOTAL_NEVER_ATTEMPTED: i64 = -1;

/// Desired state of an Installation
#[derive(CustomResource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "stevedore.io",
    version = "v1alpha1",
    kind = "Installation",
    plural = "installations",
    status = "InstallationStatus",
    printcolumn = r#"{"name":"Processed","type":"boolean","jsonPath":".status.processed","description":"Bundle installed without errors"}"#,
    printcolumn = r#"{"name":"Total","type":"integer","jsonPath":".status.total","description":"Declarations found in the last fetch"}"#,
    printcolumn = r#"{"name":"URL","type":"string","jsonPath":".spec.url","description":"Bundle location"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct InstallationSpec {
    /// Location of the bundle to install
    pub url: String,

    /// How the bundle at `url` is turned into declarations
    #[serde(default)]
    pub kind: BundleKind,
}

/// Pipeline variant selected by `spec.kind`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BundleKind {
    /// A plain multi-document manifest
    #[default]
    RawBundle,
    /// A kustomization rendered by an external build step
    Overlay,
    /// A packaged chart (not implemented)
    PackagedChart,
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleKind::RawBundle => write!(f, "raw-bundle"),
            BundleKind::Overlay => write!(f, "overlay"),
            BundleKind::PackagedChart => write!(f, "packaged-chart"),
        }
    }
}

/// Observed state of an Installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallationStatus {
    /// True once an attempt applied every declaration without error
    #[serde(default)]
    pub processed: bool,

    /// Declarations found in the most recent fetch, `-1` if never attempted
    #[serde(default = "default_total")]
    pub total: i64,

    /// Last failure message; `None` when the last attempt succeeded
    #[serde(default)]
    pub error: Option<String>,
}

fn default_total() -> i64 {
    TOTAL_NEVER_ATTEMPTED
}

impl Default for InstallationStatus {
    fn default() -> Self {
        Self {
            processed: false,
            total: TOTAL_NEVER_ATTEMPTED,
            error: None,
        }
    }
}

impl InstallationStatus {
    /// Whether the control loop should run the pipeline for this status
    pub fn needs_processing(&self) -> bool {
        !self.processed || self.error.is_some() || self.total == TOTAL_NEVER_ATTEMPTED
    }
}

impl Installation {
    /// Current status, falling back to the defaults when none was written yet
    pub fn status_or_default(&self) -> InstallationStatus {
        self.status.clone().unwrap_or_default()
    }

    pub fn needs_processing(&self) -> bool {
        self.status_or_default().needs_processing()
    }

    fn status_mut(&mut self) -> &mut InstallationStatus {
        self.status.get_or_insert_with(InstallationStatus::default)
    }

    pub fn set_total(&mut self, total: usize) {
        self.status_mut().total = i64::try_from(total).unwrap_or(i64::MAX);
    }

    pub fn set_processed(&mut self, processed: bool) {
        self.status_mut().processed = processed;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.status_mut().error = error;
    }
}
