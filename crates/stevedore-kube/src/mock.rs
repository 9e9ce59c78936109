//! Mock cluster for testing
//!
//! Keeps objects and Installations in memory and mimics the API server
//! behaviour the installer depends on: create-if-absent, discovery that
//! learns kinds from stored CustomResourceDefinitions, and resourceVersion
//! checks on status writes.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use kube::{ResourceExt, api::DynamicObject};
use stevedore_core::{Installation, SCHEMA_GROUP, SCHEMA_RESOURCE};

use crate::cluster::ClusterApi;
use crate::error::{KubeError, Result};
use crate::mapper::{RestLocation, RestMapper, Scope};

/// Identity of a stored object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub group: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone)]
pub struct OperationCounts {
    pub discoveries: usize,
    pub gets: usize,
    pub creates: usize,
    pub raw_posts: usize,
    pub status_reads: usize,
    pub status_writes: usize,
}

#[derive(Default)]
struct MockState {
    builtin: Vec<RestLocation>,
    objects: BTreeMap<ObjectKey, DynamicObject>,
    raw_posts: Vec<(String, String)>,
    raw_keys: Vec<(String, String)>,
    installations: HashMap<String, Installation>,
    rejections: HashMap<(String, String), String>,
    get_failures: HashMap<(String, String), String>,
    fail_discovery: bool,
    conflict_next_status: bool,
}

/// In-memory cluster for testing
#[derive(Clone)]
pub struct MockCluster {
    state: Arc<RwLock<MockState>>,
    operations: Arc<RwLock<OperationCounts>>,
}

impl MockCluster {
    /// Create a cluster that knows a handful of built-in kinds
    pub fn new() -> Self {
        let state = MockState {
            builtin: builtin_locations(),
            ..MockState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            operations: Arc::new(RwLock::new(OperationCounts::default())),
        }
    }

    /// Create with pre-registered Installations
    pub fn with_installations(installations: Vec<Installation>) -> Self {
        let cluster = Self::new();
        for installation in installations {
            cluster.insert_installation(installation);
        }
        cluster
    }

    /// Store an Installation, assigning resourceVersion "1" when unset
    pub fn insert_installation(&self, mut installation: Installation) {
        if installation.metadata.resource_version.is_none() {
            installation.metadata.resource_version = Some("1".to_string());
        }
        self.state
            .write()
            .unwrap()
            .installations
            .insert(installation.name_any(), installation);
    }

    pub fn installation(&self, name: &str) -> Option<Installation> {
        self.state.read().unwrap().installations.get(name).cloned()
    }

    /// Make the next create of `kind/name` fail with `message`
    pub fn reject_create(&self, kind: &str, name: &str, message: &str) {
        self.state
            .write()
            .unwrap()
            .rejections
            .insert((kind.to_string(), name.to_string()), message.to_string());
    }

    /// Make the next lookup of `kind/name` fail with `message`
    pub fn reject_get(&self, kind: &str, name: &str, message: &str) {
        self.state
            .write()
            .unwrap()
            .get_failures
            .insert((kind.to_string(), name.to_string()), message.to_string());
    }

    /// Make discovery fail until reset
    pub fn set_discovery_failure(&self, fail: bool) {
        self.state.write().unwrap().fail_discovery = fail;
    }

    /// Make the next status write fail with a conflict
    pub fn conflict_next_status_write(&self) {
        self.state.write().unwrap().conflict_next_status = true;
    }

    /// Find a stored object by kind, namespace and name
    pub fn object(&self, kind: &str, namespace: Option<&str>, name: &str) -> Option<DynamicObject> {
        let state = self.state.read().unwrap();
        state
            .objects
            .iter()
            .find(|(key, _)| {
                key.kind == kind && key.namespace.as_deref() == namespace && key.name == name
            })
            .map(|(_, obj)| obj.clone())
    }

    pub fn object_keys(&self) -> Vec<ObjectKey> {
        self.state.read().unwrap().objects.keys().cloned().collect()
    }

    pub fn object_count(&self) -> usize {
        self.state.read().unwrap().objects.len()
    }

    /// Raw POSTs as `(path, body)`, in call order
    pub fn raw_posts(&self) -> Vec<(String, String)> {
        self.state.read().unwrap().raw_posts.clone()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    fn count(&self, f: impl FnOnce(&mut OperationCounts)) {
        let mut ops = self.operations.write().unwrap();
        f(&mut ops);
    }
}

impl Default for MockCluster {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_locations() -> Vec<RestLocation> {
    vec![
        RestLocation::new("", "v1", "Namespace", "namespaces", Scope::Cluster),
        RestLocation::new("", "v1", "ConfigMap", "configmaps", Scope::Namespaced),
        RestLocation::new("", "v1", "Secret", "secrets", Scope::Namespaced),
        RestLocation::new("", "v1", "Service", "services", Scope::Namespaced),
        RestLocation::new(
            "",
            "v1",
            "ServiceAccount",
            "serviceaccounts",
            Scope::Namespaced,
        ),
        RestLocation::new("apps", "v1", "Deployment", "deployments", Scope::Namespaced),
        RestLocation::new(
            "rbac.authorization.k8s.io",
            "v1",
            "ClusterRole",
            "clusterroles",
            Scope::Cluster,
        ),
        RestLocation::new(
            SCHEMA_GROUP,
            "v1",
            "CustomResourceDefinition",
            SCHEMA_RESOURCE,
            Scope::Cluster,
        ),
    ]
}

/// Kinds served by a stored CustomResourceDefinition
fn served_locations(crd: &DynamicObject) -> Vec<RestLocation> {
    let spec = &crd.data["spec"];
    let (Some(group), Some(kind), Some(plural)) = (
        spec["group"].as_str(),
        spec["names"]["kind"].as_str(),
        spec["names"]["plural"].as_str(),
    ) else {
        return Vec::new();
    };
    let scope = match spec["scope"].as_str() {
        Some("Cluster") => Scope::Cluster,
        _ => Scope::Namespaced,
    };

    spec["versions"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|v| v["name"].as_str())
        .map(|version| RestLocation::new(group, version, kind, plural, scope))
        .collect()
}

fn object_key(location: &RestLocation, namespace: Option<&str>, name: &str) -> ObjectKey {
    ObjectKey {
        group: location.group.clone(),
        kind: location.kind.clone(),
        namespace: location.target_namespace(namespace).map(str::to_string),
        name: name.to_string(),
    }
}

#[async_trait]
impl ClusterApi for MockCluster {
    async fn discover(&self) -> Result<RestMapper> {
        self.count(|ops| ops.discoveries += 1);

        let state = self.state.read().unwrap();
        if state.fail_discovery {
            return Err(KubeError::Rejected {
                resource: "discovery".to_string(),
                message: "the server is currently unable to handle the request".to_string(),
            });
        }

        let learned = state
            .objects
            .iter()
            .filter(|(key, _)| key.group == SCHEMA_GROUP && key.kind == "CustomResourceDefinition")
            .flat_map(|(_, crd)| served_locations(crd));

        Ok(RestMapper::new(
            state.builtin.iter().cloned().chain(learned),
        ))
    }

    async fn get(
        &self,
        location: &RestLocation,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>> {
        self.count(|ops| ops.gets += 1);

        let key = object_key(location, namespace, name);
        let mut state = self.state.write().unwrap();
        if let Some(message) = state
            .get_failures
            .remove(&(key.kind.clone(), key.name.clone()))
        {
            return Err(KubeError::Rejected {
                resource: format!("{}/{}", key.kind, key.name),
                message,
            });
        }
        Ok(state.objects.get(&key).cloned())
    }

    async fn create(
        &self,
        location: &RestLocation,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> Result<DynamicObject> {
        self.count(|ops| ops.creates += 1);

        let name = object
            .metadata
            .name
            .clone()
            .ok_or_else(|| KubeError::Rejected {
                resource: location.kind.clone(),
                message: "metadata.name: Required value".to_string(),
            })?;
        let key = object_key(location, namespace, &name);
        let resource = format!("{}/{}", key.kind, key.name);

        let mut state = self.state.write().unwrap();
        if let Some(message) = state
            .rejections
            .remove(&(key.kind.clone(), key.name.clone()))
        {
            return Err(KubeError::Rejected { resource, message });
        }
        if state.objects.contains_key(&key) {
            return Err(KubeError::AlreadyExists { resource });
        }

        let mut stored = object.clone();
        stored.metadata.namespace = key.namespace.clone();
        stored.metadata.resource_version = Some("1".to_string());
        state.objects.insert(key, stored.clone());
        Ok(stored)
    }

    async fn post_raw(&self, path: &str, body: Vec<u8>) -> Result<()> {
        self.count(|ops| ops.raw_posts += 1);

        let text = String::from_utf8_lossy(&body).to_string();
        let value: serde_yaml::Value = serde_yaml::from_str(&text)?;
        let kind = value["kind"].as_str().unwrap_or_default().to_string();
        let name = value["metadata"]["name"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        let mut state = self.state.write().unwrap();
        let raw_key = (kind.clone(), name.clone());
        if state.raw_keys.contains(&raw_key) {
            return Err(KubeError::AlreadyExists {
                resource: format!("{}/{}", kind, name),
            });
        }
        state.raw_keys.push(raw_key);
        state.raw_posts.push((path.to_string(), text));
        Ok(())
    }

    async fn get_installation(&self, name: &str) -> Result<Option<Installation>> {
        self.count(|ops| ops.status_reads += 1);
        Ok(self.installation(name))
    }

    async fn update_installation_status(
        &self,
        installation: &Installation,
    ) -> Result<Installation> {
        self.count(|ops| ops.status_writes += 1);

        let name = installation.name_any();
        let resource = format!("Installation/{}", name);
        let mut state = self.state.write().unwrap();

        if std::mem::take(&mut state.conflict_next_status) {
            return Err(KubeError::Conflict {
                resource,
                message: "the object has been modified".to_string(),
            });
        }

        let stored = state
            .installations
            .get_mut(&name)
            .ok_or_else(|| KubeError::NotFound {
                resource: resource.clone(),
            })?;

        if stored.metadata.resource_version != installation.metadata.resource_version {
            return Err(KubeError::Conflict {
                resource,
                message: "resourceVersion mismatch".to_string(),
            });
        }

        let next = stored
            .metadata
            .resource_version
            .as_deref()
            .and_then(|rv| rv.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        stored.status = installation.status.clone();
        stored.metadata.resource_version = Some(next.to_string());
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stevedore_core::{InstallationSpec, InstallationStatus};

    fn configmaps() -> RestLocation {
        RestLocation::new("", "v1", "ConfigMap", "configmaps", Scope::Namespaced)
    }

    fn configmap(name: &str) -> DynamicObject {
        serde_json::from_value(serde_json::json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": name },
            "data": { "k": "v" },
        }))
        .unwrap()
    }

    fn installation(name: &str) -> Installation {
        Installation::new(
            name,
            InstallationSpec {
                url: "https://bundles.example.com/a.yaml".to_string(),
                kind: Default::default(),
            },
        )
    }

    #[tokio::test]
    async fn test_create_then_already_exists() {
        let cluster = MockCluster::new();
        cluster
            .create(&configmaps(), None, &configmap("a"))
            .await
            .unwrap();

        let err = cluster
            .create(&configmaps(), Some("default"), &configmap("a"))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());

        assert!(cluster.object("ConfigMap", Some("default"), "a").is_some());
        assert_eq!(cluster.operation_counts().creates, 2);
    }

    #[tokio::test]
    async fn test_get_missing_object() {
        let cluster = MockCluster::new();
        let found = cluster.get(&configmaps(), None, "missing").await.unwrap();
        assert!(found.is_none());
        assert_eq!(cluster.operation_counts().gets, 1);
    }

    #[tokio::test]
    async fn test_get_failure_applies_once() {
        let cluster = MockCluster::new();
        cluster.reject_get("ConfigMap", "a", "etcdserver: request timed out");

        let err = cluster.get(&configmaps(), None, "a").await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("request timed out"));

        assert!(cluster.get(&configmaps(), None, "a").await.unwrap().is_none());
        assert_eq!(cluster.operation_counts().gets, 2);
    }

    #[tokio::test]
    async fn test_rejection_applies_once() {
        let cluster = MockCluster::new();
        cluster.reject_create("ConfigMap", "a", "field is immutable");

        let err = cluster
            .create(&configmaps(), None, &configmap("a"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("field is immutable"));

        cluster
            .create(&configmaps(), None, &configmap("a"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_discovery_learns_stored_crds() {
        let cluster = MockCluster::new();
        let before = cluster.discover().await.unwrap();
        assert!(before.rest_mapping("example.io", "Widget", "v1").is_none());

        let crd: DynamicObject = serde_json::from_value(serde_json::json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": { "name": "widgets.example.io" },
            "spec": {
                "group": "example.io",
                "scope": "Cluster",
                "names": { "kind": "Widget", "plural": "widgets" },
                "versions": [{ "name": "v1" }, { "name": "v2" }],
            },
        }))
        .unwrap();
        let crds = RestLocation::new(
            SCHEMA_GROUP,
            "v1",
            "CustomResourceDefinition",
            SCHEMA_RESOURCE,
            Scope::Cluster,
        );
        cluster.create(&crds, None, &crd).await.unwrap();

        let after = cluster.discover().await.unwrap();
        let widget = after.rest_mapping("example.io", "Widget", "v2").unwrap();
        assert_eq!(widget.scope, Scope::Cluster);
        assert_eq!(cluster.operation_counts().discoveries, 2);
    }

    #[tokio::test]
    async fn test_discovery_failure() {
        let cluster = MockCluster::new();
        cluster.set_discovery_failure(true);
        assert!(cluster.discover().await.is_err());
    }

    #[tokio::test]
    async fn test_raw_post_duplicates() {
        let cluster = MockCluster::new();
        let body = b"apiVersion: v1\nkind: Namespace\nmetadata:\n  name: web\n".to_vec();

        cluster.post_raw("/api/v1", body.clone()).await.unwrap();
        let err = cluster.post_raw("/api/v1", body).await.unwrap_err();

        assert!(err.is_already_exists());
        assert_eq!(cluster.raw_posts().len(), 1);
        assert_eq!(cluster.operation_counts().raw_posts, 2);
    }

    #[tokio::test]
    async fn test_status_write_bumps_resource_version() {
        let cluster = MockCluster::with_installations(vec![installation("demo")]);

        let mut current = cluster.get_installation("demo").await.unwrap().unwrap();
        current.status = Some(InstallationStatus {
            processed: true,
            total: 2,
            error: None,
        });

        let written = cluster.update_installation_status(&current).await.unwrap();
        assert_eq!(written.metadata.resource_version.as_deref(), Some("2"));

        // Stale resourceVersion
        let err = cluster
            .update_installation_status(&current)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_injected_status_conflict() {
        let cluster = MockCluster::with_installations(vec![installation("demo")]);
        cluster.conflict_next_status_write();

        let current = cluster.installation("demo").unwrap();
        assert!(
            cluster
                .update_installation_status(&current)
                .await
                .unwrap_err()
                .is_conflict()
        );
        assert!(cluster.update_installation_status(&current).await.is_ok());
    }
}
