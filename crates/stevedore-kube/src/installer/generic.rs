use stevedore_core::Declaration;

use super::ApplyOutcome;
use crate::cluster::ClusterApi;
use crate::error::InstallError;
use crate::mapper::RestMapper;

/// Create-if-absent installer for ordinary objects
pub struct GenericObjectInstaller<'a, C: ClusterApi + ?Sized> {
    cluster: &'a C,
    mapper: &'a RestMapper,
}

impl<'a, C: ClusterApi + ?Sized> GenericObjectInstaller<'a, C> {
    pub fn new(cluster: &'a C, mapper: &'a RestMapper) -> Self {
        Self { cluster, mapper }
    }

    pub async fn install(&self, declaration: &Declaration) -> Result<ApplyOutcome, InstallError> {
        let object = declaration.object()?;
        let header = declaration.header();

        let location = self
            .mapper
            .rest_mapping(&header.group, &header.kind, &header.version)
            .ok_or_else(|| InstallError::Mapping {
                group: header.group.clone(),
                version: header.version.clone(),
                kind: header.kind.clone(),
            })?;

        let namespace = location.target_namespace(object.metadata.namespace.as_deref());
        let resource = header.display_name();

        tracing::debug!(
            resource = %resource,
            path = %location.collection_path(namespace),
            "Creating object"
        );

        match self.cluster.create(location, namespace, object).await {
            Ok(_) => {
                tracing::info!(resource = %resource, "Created object");
                Ok(ApplyOutcome::Created)
            }
            Err(e) if e.is_already_exists() => {
                tracing::debug!(resource = %resource, "Object already exists, skipping");
                Ok(ApplyOutcome::ConflictSkip)
            }
            Err(source) => Err(InstallError::Apply { resource, source }),
        }
    }
}
