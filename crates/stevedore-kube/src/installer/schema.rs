use stevedore_core::{Declaration, SCHEMA_GROUP, SCHEMA_VERSION};

use super::ApplyOutcome;
use crate::cluster::ClusterApi;
use crate::error::InstallError;
use crate::mapper::{RestLocation, Scope};

/// Get-or-create installer for schema-defining resources
///
/// An existing object is never modified, even when the declaration differs.
pub struct SchemaObjectInstaller<'a, C: ClusterApi + ?Sized> {
    cluster: &'a C,
    location: RestLocation,
}

impl<'a, C: ClusterApi + ?Sized> SchemaObjectInstaller<'a, C> {
    /// Installer addressing the fixed `resource` collection of the schema API
    pub fn new(cluster: &'a C, resource: &str) -> Self {
        Self {
            cluster,
            location: RestLocation::new(
                SCHEMA_GROUP,
                SCHEMA_VERSION,
                "CustomResourceDefinition",
                resource,
                Scope::Cluster,
            ),
        }
    }

    pub async fn install(&self, declaration: &Declaration) -> Result<ApplyOutcome, InstallError> {
        let name = declaration.require_name()?;
        let resource = declaration.header().display_name();

        let existing = self
            .cluster
            .get(&self.location, None, name)
            .await
            .map_err(|source| InstallError::Apply {
                resource: resource.clone(),
                source,
            })?;

        if existing.is_some() {
            tracing::debug!(resource = %resource, "Schema object exists, leaving it untouched");
            return Ok(ApplyOutcome::Untouched);
        }

        let object = declaration.object()?;
        self.cluster
            .create(&self.location, None, object)
            .await
            .map_err(|source| InstallError::Apply {
                resource: resource.clone(),
                source,
            })?;

        tracing::info!(resource = %resource, "Created schema object");
        Ok(ApplyOutcome::Created)
    }
}
