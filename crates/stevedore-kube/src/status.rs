//! Writing attempt results back onto the Installation

use kube::ResourceExt;
use stevedore_core::Installation;

use crate::cluster::ClusterApi;
use crate::error::InstallError;
use crate::pipeline::RunReport;

/// Copy the outcome of an attempt into `installation.status`
///
/// `total` is only touched when the attempt drained the bundle.
pub fn apply_report(installation: &mut Installation, report: &RunReport) {
    if let Some(total) = report.total {
        installation.set_total(total);
    }
    installation.set_error(report.error.as_ref().map(ToString::to_string));
    installation.set_processed(report.is_success());
}

/// Persists attempt results through the status subresource
pub struct StatusReporter<'a, C: ClusterApi + ?Sized> {
    cluster: &'a C,
}

impl<'a, C: ClusterApi + ?Sized> StatusReporter<'a, C> {
    pub fn new(cluster: &'a C) -> Self {
        Self { cluster }
    }

    /// Write the report against the resourceVersion `installation` was read at
    pub async fn report(
        &self,
        installation: &Installation,
        report: &RunReport,
    ) -> Result<Installation, InstallError> {
        let name = installation.name_any();
        let mut updated = installation.clone();
        apply_report(&mut updated, report);

        self.cluster
            .update_installation_status(&updated)
            .await
            .map_err(|source| {
                tracing::error!(installation = %name, error = %source, "Failed to persist status");
                InstallError::Status { name, source }
            })
    }
}
