//! Stevedore Kube - Kubernetes integration for Stevedore
//!
//! This crate provides:
//! - **Cluster seam**: `ClusterApi`, implemented by `KubeCluster` and the in-memory `MockCluster`
//! - **REST mapping**: discovery snapshots resolving (group, kind, version) to collections
//! - **Installers**: get-or-create for schema objects, create-if-absent for everything else
//! - **Pipeline**: fetch, split, classify and apply one bundle per attempt
//! - **Status reporting and reconciliation** of `Installation` resources

pub mod cluster;
pub mod error;
pub mod installer;
pub mod mapper;
pub mod mock;
pub mod pipeline;
pub mod reconcile;
pub mod status;

pub use cluster::{ClusterApi, KubeCluster};
pub use error::{InstallError, KubeError, Result};
pub use installer::{ApplyOutcome, ApplySummary, GenericObjectInstaller, SchemaObjectInstaller};
pub use mapper::{DEFAULT_NAMESPACE, RestLocation, RestMapper, Scope};
pub use mock::{MockCluster, ObjectKey, OperationCounts};
pub use pipeline::{AttemptPhase, InstallPipeline, RunReport};
pub use reconcile::{Outcome, Reconciler};
pub use status::{StatusReporter, apply_report};
