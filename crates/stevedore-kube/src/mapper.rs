//! REST mapping from (group, kind, version) to a collection endpoint
//!
//! The mapper is a snapshot of API discovery. It is rebuilt on every
//! installation attempt, so kinds registered by a previous attempt become
//! mappable on the next one.

use std::collections::HashMap;
use std::fmt;

use kube::discovery::{self, ApiResource, Discovery};

/// Namespace used for namespaced objects that do not declare one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Whether a kind lives inside namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Cluster,
    Namespaced,
}

impl From<&discovery::Scope> for Scope {
    fn from(scope: &discovery::Scope) -> Self {
        match scope {
            discovery::Scope::Cluster => Scope::Cluster,
            discovery::Scope::Namespaced => Scope::Namespaced,
        }
    }
}

/// Where objects of one kind are created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestLocation {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub scope: Scope,
}

impl RestLocation {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
        plural: impl Into<String>,
        scope: Scope,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
            plural: plural.into(),
            scope,
        }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// `/api` for the core group, `/apis` for everything else
    pub fn api_root(&self) -> &'static str {
        if self.group.is_empty() { "/api" } else { "/apis" }
    }

    pub fn is_namespaced(&self) -> bool {
        self.scope == Scope::Namespaced
    }

    /// Namespace an object should be created in
    ///
    /// Namespaced kinds fall back to [`DEFAULT_NAMESPACE`]; cluster-scoped
    /// kinds ignore whatever the object declares.
    pub fn target_namespace<'a>(&self, declared: Option<&'a str>) -> Option<&'a str> {
        match self.scope {
            Scope::Namespaced => Some(declared.unwrap_or(DEFAULT_NAMESPACE)),
            Scope::Cluster => None,
        }
    }

    /// Collection endpoint, e.g. `/apis/apps/v1/namespaces/web/deployments`
    pub fn collection_path(&self, namespace: Option<&str>) -> String {
        let base = format!("{}/{}", self.api_root(), self.api_version());
        match self.target_namespace(namespace) {
            Some(ns) => format!("{}/namespaces/{}/{}", base, ns, self.plural),
            None => format!("{}/{}", base, self.plural),
        }
    }

    /// kube-rs handle for building dynamic `Api`s
    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: self.api_version(),
            kind: self.kind.clone(),
            plural: self.plural.clone(),
        }
    }
}

impl fmt::Display for RestLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.plural)
    }
}

/// Snapshot of the cluster's known kinds
#[derive(Debug, Clone, Default)]
pub struct RestMapper {
    locations: HashMap<(String, String, String), RestLocation>,
}

impl RestMapper {
    pub fn new(locations: impl IntoIterator<Item = RestLocation>) -> Self {
        let mut mapper = Self::default();
        for location in locations {
            mapper.insert(location);
        }
        mapper
    }

    /// Build a mapper from a completed discovery run
    pub fn from_discovery(discovery: &Discovery) -> Self {
        let mut mapper = Self::default();
        for group in discovery.groups() {
            for version in group.versions() {
                for (resource, caps) in group.versioned_resources(version) {
                    mapper.insert(RestLocation::new(
                        resource.group,
                        resource.version,
                        resource.kind,
                        resource.plural,
                        Scope::from(&caps.scope),
                    ));
                }
            }
        }
        mapper
    }

    pub fn insert(&mut self, location: RestLocation) {
        let key = (
            location.group.clone(),
            location.version.clone(),
            location.kind.clone(),
        );
        self.locations.insert(key, location);
    }

    /// Resolve `(group, kind)` at exactly `version`
    pub fn rest_mapping(&self, group: &str, kind: &str, version: &str) -> Option<&RestLocation> {
        self.locations
            .get(&(group.to_string(), version.to_string(), kind.to_string()))
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
