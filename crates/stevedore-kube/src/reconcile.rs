//! Reconciling a single Installation by name

use std::fmt;
use std::sync::Arc;

use stevedore_core::InstallerConfig;
use stevedore_engine::OverlayBuilder;
use stevedore_repo::BundleSource;
use tracing::instrument;

use crate::cluster::ClusterApi;
use crate::error::InstallError;
use crate::pipeline::InstallPipeline;
use crate::status::StatusReporter;

/// What a reconcile did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Status says the bundle is installed; nothing was done
    Skipped,
    /// The Installation no longer exists
    Gone,
    Succeeded {
        total: usize,
    },
    /// The attempt failed and the failure was recorded in status
    Failed {
        total: Option<usize>,
        error: String,
    },
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Skipped => write!(f, "already processed"),
            Outcome::Gone => write!(f, "not found"),
            Outcome::Succeeded { total } => write!(f, "processed {} declaration(s)", total),
            Outcome::Failed { error, .. } => write!(f, "failed: {}", error),
        }
    }
}

/// Entry point of the control loop
pub struct Reconciler<C, S, B>
where
    C: ClusterApi,
    S: BundleSource,
    B: OverlayBuilder,
{
    pipeline: InstallPipeline<C, S, B>,
    version: Option<String>,
}

impl<C, S, B> Reconciler<C, S, B>
where
    C: ClusterApi,
    S: BundleSource,
    B: OverlayBuilder,
{
    pub fn new(cluster: C, source: S, builder: B, config: Arc<InstallerConfig>) -> Self {
        Self {
            pipeline: InstallPipeline::new(cluster, source, builder, config),
            version: None,
        }
    }

    /// Operator version reported in completion logs
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn config(&self) -> &InstallerConfig {
        self.pipeline.config()
    }

    pub fn cluster(&self) -> &C {
        self.pipeline.cluster()
    }

    /// Run the pipeline for `name` if its status asks for it
    ///
    /// A failed attempt is recorded in status and returned as
    /// [`Outcome::Failed`]. Only failures to read or write the Installation
    /// itself are returned as errors.
    #[instrument(skip_all, fields(installation = %name))]
    pub async fn reconcile(&self, name: &str) -> Result<Outcome, InstallError> {
        let cluster = self.pipeline.cluster();

        let installation = match cluster.get_installation(name).await {
            Ok(Some(installation)) => installation,
            Ok(None) => {
                tracing::debug!("Installation not found");
                return Ok(Outcome::Gone);
            }
            Err(source) => {
                return Err(InstallError::Status {
                    name: name.to_string(),
                    source,
                });
            }
        };

        if !installation.needs_processing() {
            tracing::debug!("Installation already processed");
            return Ok(Outcome::Skipped);
        }

        tracing::info!(
            url = %installation.spec.url,
            kind = %installation.spec.kind,
            "Installing bundle"
        );

        let report = self.pipeline.run(&installation).await;
        StatusReporter::new(cluster)
            .report(&installation, &report)
            .await?;

        let version = self.version.as_deref().unwrap_or("unknown");
        match report.error {
            None => {
                let total = report.total.unwrap_or_default();
                tracing::info!(
                    version,
                    total,
                    summary = %report.summary.summary(),
                    "Installation processed"
                );
                Ok(Outcome::Succeeded { total })
            }
            Some(error) => {
                tracing::warn!(
                    version,
                    phase = %report.phase,
                    category = error.category(),
                    error = %error,
                    "Installation failed"
                );
                Ok(Outcome::Failed {
                    total: report.total,
                    error: error.to_string(),
                })
            }
        }
    }
}
