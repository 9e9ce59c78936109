//! One installation attempt, from fetch to the last applied declaration
//!
//! An attempt moves through `Pending -> Fetching -> Splitting -> Applying(i)`
//! and ends in `Succeeded` or `Failed(i)`. Every attempt starts over from
//! `Pending`; nothing is carried between attempts except what is already in
//! the cluster.

use std::fmt;
use std::sync::Arc;

use stevedore_core::{
    ApplyStrategy, BundleKind, Declaration, Installation, InstallerConfig, classify,
    split_documents,
};
use stevedore_engine::{OverlayBuilder, OverlayRenderer, split_on_marker};
use stevedore_repo::{BundleSource, validate_url};

use crate::cluster::ClusterApi;
use crate::error::InstallError;
use crate::installer::{
    ApplyOutcome, ApplySummary, GenericObjectInstaller, SchemaObjectInstaller,
};

/// Where an attempt is, or where it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    Pending,
    Fetching,
    Rendering,
    Splitting,
    /// Applying the declaration with this 1-based index
    Applying(usize),
    Succeeded,
    /// Stopped at declaration `i`; 0 when it stopped before applying anything
    Failed(usize),
}

impl fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptPhase::Pending => write!(f, "pending"),
            AttemptPhase::Fetching => write!(f, "fetching"),
            AttemptPhase::Rendering => write!(f, "rendering"),
            AttemptPhase::Splitting => write!(f, "splitting"),
            AttemptPhase::Applying(i) => write!(f, "applying #{}", i),
            AttemptPhase::Succeeded => write!(f, "succeeded"),
            AttemptPhase::Failed(i) => write!(f, "failed at #{}", i),
        }
    }
}

/// Result of one attempt, consumed by the status reporter
#[derive(Debug)]
pub struct RunReport {
    /// Declarations drained from the bundle, `None` if draining never finished
    pub total: Option<usize>,
    pub phase: AttemptPhase,
    pub error: Option<InstallError>,
    pub summary: ApplySummary,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

struct Attempt {
    phase: AttemptPhase,
    total: Option<usize>,
    summary: ApplySummary,
}

impl Attempt {
    fn new() -> Self {
        Self {
            phase: AttemptPhase::Pending,
            total: None,
            summary: ApplySummary::default(),
        }
    }

    fn enter(&mut self, phase: AttemptPhase) {
        tracing::debug!(from = %self.phase, to = %phase, "Attempt phase");
        self.phase = phase;
    }

    fn finish(self, result: Result<(), InstallError>) -> RunReport {
        let (phase, error) = match result {
            Ok(()) => (AttemptPhase::Succeeded, None),
            Err(e) => {
                let at = match self.phase {
                    AttemptPhase::Applying(i) => i,
                    _ => 0,
                };
                (AttemptPhase::Failed(at), Some(e))
            }
        };
        RunReport {
            total: self.total,
            phase,
            error,
            summary: self.summary,
        }
    }
}

/// Fetches, splits, classifies and applies an Installation's bundle
pub struct InstallPipeline<C, S, B>
where
    C: ClusterApi,
    S: BundleSource,
    B: OverlayBuilder,
{
    cluster: C,
    source: S,
    renderer: OverlayRenderer<B>,
    config: Arc<InstallerConfig>,
}

impl<C, S, B> InstallPipeline<C, S, B>
where
    C: ClusterApi,
    S: BundleSource,
    B: OverlayBuilder,
{
    pub fn new(cluster: C, source: S, builder: B, config: Arc<InstallerConfig>) -> Self {
        Self {
            cluster,
            source,
            renderer: OverlayRenderer::new(builder),
            config,
        }
    }

    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Run one attempt; the first fatal error ends it
    pub async fn run(&self, installation: &Installation) -> RunReport {
        let mut attempt = Attempt::new();
        let kind = installation.spec.kind;

        let result = match kind {
            BundleKind::RawBundle => self.run_raw(&installation.spec.url, &mut attempt).await,
            BundleKind::Overlay => self.run_overlay(&installation.spec.url, &mut attempt).await,
            BundleKind::PackagedChart => Err(InstallError::Unsupported { kind }),
        };

        let report = attempt.finish(result);
        tracing::debug!(
            phase = %report.phase,
            summary = %report.summary.summary(),
            "Attempt finished"
        );
        report
    }

    async fn fetch(&self, url: &str, attempt: &mut Attempt) -> Result<Vec<u8>, InstallError> {
        validate_url(url)?;
        attempt.enter(AttemptPhase::Fetching);
        Ok(self.source.fetch(url).await?)
    }

    async fn run_raw(&self, url: &str, attempt: &mut Attempt) -> Result<(), InstallError> {
        let bytes = self.fetch(url, attempt).await?;

        attempt.enter(AttemptPhase::Splitting);
        let documents = split_documents(&bytes)?;
        attempt.total = Some(documents.len());

        let mapper = self
            .cluster
            .discover()
            .await
            .map_err(InstallError::Discovery)?;

        for document in documents {
            attempt.enter(AttemptPhase::Applying(document.index));

            let declaration = Declaration::parse(document)?;
            tracing::debug!(declaration = %declaration, "Applying declaration");

            let outcome = match classify(declaration.header()) {
                ApplyStrategy::SchemaObject { resource } => {
                    SchemaObjectInstaller::new(&self.cluster, resource)
                        .install(&declaration)
                        .await?
                }
                ApplyStrategy::Generic => {
                    GenericObjectInstaller::new(&self.cluster, &mapper)
                        .install(&declaration)
                        .await?
                }
            };

            attempt
                .summary
                .record(declaration.header().display_name(), outcome);
        }

        Ok(())
    }

    async fn run_overlay(&self, url: &str, attempt: &mut Attempt) -> Result<(), InstallError> {
        let descriptor = self.fetch(url, attempt).await?;

        attempt.enter(AttemptPhase::Rendering);
        let rendered = self.renderer.render(&descriptor).await?;

        attempt.enter(AttemptPhase::Splitting);
        let chunks = split_on_marker(&rendered);
        attempt.total = Some(chunks.len());

        let overlay = &self.config.overlay;
        for (i, chunk) in chunks.into_iter().enumerate() {
            let index = i + 1;
            attempt.enter(AttemptPhase::Applying(index));
            let resource = format!("overlay document #{}", index);

            match self.cluster.post_raw(&overlay.post_path, chunk).await {
                Ok(()) => {
                    tracing::info!(
                        resource = %resource,
                        path = %overlay.post_path,
                        "Posted object"
                    );
                    attempt.summary.record(resource, ApplyOutcome::Created);
                }
                Err(e) if e.is_already_exists() && overlay.tolerate_existing => {
                    tracing::debug!(resource = %resource, "Object already exists, skipping");
                    attempt.summary.record(resource, ApplyOutcome::ConflictSkip);
                }
                Err(source) => return Err(InstallError::Apply { resource, source }),
            }
        }

        Ok(())
    }
}
