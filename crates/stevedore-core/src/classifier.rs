//! Routing of declarations to an apply strategy

use crate::declaration::DeclarationHeader;

/// API group of schema-defining resources
pub const SCHEMA_GROUP: &str = "apiextensions.k8s.io";

/// Version of [`SCHEMA_GROUP`] handled by the schema-object installer
pub const SCHEMA_VERSION: &str = "v1";

/// Collection name used for schema-defining resources
pub const SCHEMA_RESOURCE: &str = "customresourcedefinitions";

/// How a declaration gets applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyStrategy {
    /// Get-or-create against a fixed collection; existing objects are never overwritten
    SchemaObject { resource: &'static str },
    /// Discovery-resolved create; `AlreadyExists` counts as success
    Generic,
}

/// Pick the apply strategy for a declaration
///
/// Only the exact group and version of the schema API are special; everything
/// else, including unknown groups, goes through the generic path.
pub fn classify(header: &DeclarationHeader) -> ApplyStrategy {
    if header.group == SCHEMA_GROUP && header.version == SCHEMA_VERSION {
        ApplyStrategy::SchemaObject {
            resource: SCHEMA_RESOURCE,
        }
    } else {
        ApplyStrategy::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::split_api_version;

    fn header(api_version: &str, kind: &str) -> DeclarationHeader {
        let (group, version) = split_api_version(api_version);
        DeclarationHeader {
            api_version: api_version.to_string(),
            group,
            version,
            kind: kind.to_string(),
            name: Some("x".to_string()),
            namespace: None,
        }
    }

    #[test]
    fn test_crd_is_schema_object() {
        let strategy = classify(&header(
            "apiextensions.k8s.io/v1",
            "CustomResourceDefinition",
        ));
        assert_eq!(
            strategy,
            ApplyStrategy::SchemaObject {
                resource: "customresourcedefinitions"
            }
        );
    }

    #[test]
    fn test_other_schema_versions_are_generic() {
        let strategy = classify(&header(
            "apiextensions.k8s.io/v1beta1",
            "CustomResourceDefinition",
        ));
        assert_eq!(strategy, ApplyStrategy::Generic);
    }

    #[test]
    fn test_core_and_named_groups_are_generic() {
        assert_eq!(classify(&header("v1", "ConfigMap")), ApplyStrategy::Generic);
        assert_eq!(
            classify(&header("apps/v1", "Deployment")),
            ApplyStrategy::Generic
        );
        assert_eq!(
            classify(&header("cert-manager.io/v1", "Issuer")),
            ApplyStrategy::Generic
        );
    }
}
