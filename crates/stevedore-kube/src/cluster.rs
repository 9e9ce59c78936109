//! Cluster access used by the installers and the reconciler
//!
//! [`ClusterApi`] is the only way the pipeline talks to the control plane.
//! [`KubeCluster`] implements it over a kube-rs client; tests use
//! [`crate::mock::MockCluster`].

use async_trait::async_trait;
use kube::{
    Client, ResourceExt,
    api::{Api, DynamicObject, Patch, PatchParams, PostParams},
    discovery::Discovery,
};
use serde_json::json;
use stevedore_core::Installation;

use crate::error::{KubeError, Result};
use crate::mapper::{RestLocation, RestMapper};

/// Operations the installer needs from the cluster
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Run API discovery and snapshot the result
    async fn discover(&self) -> Result<RestMapper>;

    /// Read an object, `None` when it does not exist
    async fn get(
        &self,
        location: &RestLocation,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>>;

    /// Create an object; an existing object yields an "already exists" error
    async fn create(
        &self,
        location: &RestLocation,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> Result<DynamicObject>;

    /// POST a raw YAML body to an API path
    async fn post_raw(&self, path: &str, body: Vec<u8>) -> Result<()>;

    async fn get_installation(&self, name: &str) -> Result<Option<Installation>>;

    /// Write `installation.status`, guarded by its `resourceVersion`
    async fn update_installation_status(&self, installation: &Installation)
    -> Result<Installation>;
}

/// [`ClusterApi`] backed by a live API server
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create from the default kubeconfig or in-cluster environment
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn api_for(&self, location: &RestLocation, namespace: Option<&str>) -> Api<DynamicObject> {
        let resource = location.api_resource();
        match location.target_namespace(namespace) {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        }
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn discover(&self) -> Result<RestMapper> {
        let discovery = Discovery::new(self.client.clone())
            .run()
            .await
            .map_err(KubeError::Api)?;
        Ok(RestMapper::from_discovery(&discovery))
    }

    async fn get(
        &self,
        location: &RestLocation,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>> {
        let api = self.api_for(location, namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn create(
        &self,
        location: &RestLocation,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> Result<DynamicObject> {
        let api = self.api_for(location, namespace);
        Ok(api.create(&PostParams::default(), object).await?)
    }

    async fn post_raw(&self, path: &str, body: Vec<u8>) -> Result<()> {
        let request = http::Request::post(path)
            .header(http::header::CONTENT_TYPE, "application/yaml")
            .body(body)
            .map_err(|e| KubeError::InvalidConfig(format!("bad request for {}: {}", path, e)))?;
        self.client.request_text(request).await?;
        Ok(())
    }

    async fn get_installation(&self, name: &str) -> Result<Option<Installation>> {
        let api: Api<Installation> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?)
    }

    async fn update_installation_status(
        &self,
        installation: &Installation,
    ) -> Result<Installation> {
        let api: Api<Installation> = Api::all(self.client.clone());
        let name = installation.name_any();

        // resourceVersion in a merge patch turns it into a conditional write
        let patch = json!({
            "metadata": { "resourceVersion": installation.resource_version() },
            "status": installation.status_or_default(),
        });

        Ok(api
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?)
    }
}
