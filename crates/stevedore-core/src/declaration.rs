//! Declarations extracted from a bundle
//!
//! A [`Declaration`] keeps the normalized bytes of one document together with
//! the small header needed to route it. The full dynamic object is only
//! decoded when an installer asks for it.

use std::fmt;

use kube::api::DynamicObject;
use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::error::{CoreError, Result};

/// One normalized document from the bundle stream, in bundle order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// 1-based position among the non-empty documents of the bundle
    pub index: usize,
    /// Canonical YAML for the document
    pub bytes: Vec<u8>,
}

/// Routing information read from a declaration without decoding its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationHeader {
    pub api_version: String,
    pub group: String,
    pub version: String,
    pub kind: String,
    pub name: Option<String>,
    pub namespace: Option<String>,
}

impl DeclarationHeader {
    /// Display name for logging: `namespace/Kind/name` or `Kind/name`
    pub fn display_name(&self) -> String {
        let name = self.name.as_deref().unwrap_or("unnamed");
        match &self.namespace {
            Some(ns) => format!("{}/{}/{}", ns, self.kind, name),
            None => format!("{}/{}", self.kind, name),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHeader {
    #[serde(default)]
    api_version: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
}

#[derive(Deserialize, Default)]
struct RawMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
}

/// A self-describing object from the bundle, not yet applied
#[derive(Debug)]
pub struct Declaration {
    index: usize,
    raw: Vec<u8>,
    header: DeclarationHeader,
    payload: OnceCell<DynamicObject>,
}

impl Declaration {
    /// Read the header of a document
    ///
    /// Fails when the document is not a mapping or lacks `apiVersion`/`kind`.
    pub fn parse(document: Document) -> Result<Self> {
        let index = document.index;
        let fields: RawHeader = serde_yaml::from_slice(&document.bytes).map_err(|e| {
            CoreError::MalformedDeclaration {
                index,
                message: e.to_string(),
            }
        })?;

        let api_version = fields
            .api_version
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CoreError::MalformedDeclaration {
                index,
                message: "missing apiVersion".to_string(),
            })?;
        let kind = fields
            .kind
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CoreError::MalformedDeclaration {
                index,
                message: "missing kind".to_string(),
            })?;

        let (group, version) = split_api_version(&api_version);
        let metadata = fields.metadata.unwrap_or_default();

        Ok(Self {
            index,
            raw: document.bytes,
            header: DeclarationHeader {
                api_version,
                group,
                version,
                kind,
                name: metadata.name,
                namespace: metadata.namespace,
            },
            payload: OnceCell::new(),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn header(&self) -> &DeclarationHeader {
        &self.header
    }

    /// Decode the full dynamic object, once
    pub fn object(&self) -> Result<&DynamicObject> {
        self.payload.get_or_try_init(|| {
            let obj: DynamicObject = serde_yaml::from_slice(&self.raw).map_err(|e| {
                CoreError::MalformedDeclaration {
                    index: self.index,
                    message: e.to_string(),
                }
            })?;
            if obj.types.is_none() {
                return Err(CoreError::MalformedDeclaration {
                    index: self.index,
                    message: "missing apiVersion or kind".to_string(),
                });
            }
            Ok(obj)
        })
    }

    /// `metadata.name`, required by installers that address objects by name
    pub fn require_name(&self) -> Result<&str> {
        self.header
            .name
            .as_deref()
            .ok_or_else(|| CoreError::MissingField {
                field: format!("metadata.name (declaration {})", self.index),
            })
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.index, self.header.display_name())
    }
}

/// Split an apiVersion into group and version
///
/// - "apps/v1" -> group="apps", version="v1"
/// - "v1" -> group="", version="v1" (core API)
pub fn split_api_version(api_version: &str) -> (String, String) {
    match api_version.rsplit_once('/') {
        Some((g, v)) => (g.to_string(), v.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(index: usize, yaml: &str) -> Document {
        Document {
            index,
            bytes: yaml.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_split_api_version() {
        assert_eq!(
            split_api_version("apps/v1"),
            ("apps".to_string(), "v1".to_string())
        );
        assert_eq!(split_api_version("v1"), (String::new(), "v1".to_string()));
        assert_eq!(
            split_api_version("apiextensions.k8s.io/v1"),
            ("apiextensions.k8s.io".to_string(), "v1".to_string())
        );
    }

    #[test]
    fn test_parse_header() {
        let decl = Declaration::parse(doc(
            1,
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: shop\n",
        ))
        .unwrap();

        let header = decl.header();
        assert_eq!(header.group, "apps");
        assert_eq!(header.version, "v1");
        assert_eq!(header.kind, "Deployment");
        assert_eq!(header.name.as_deref(), Some("web"));
        assert_eq!(header.namespace.as_deref(), Some("shop"));
        assert_eq!(header.display_name(), "shop/Deployment/web");
        assert_eq!(decl.to_string(), "#1 shop/Deployment/web");
    }

    #[test]
    fn test_parse_header_without_metadata() {
        let decl = Declaration::parse(doc(2, "apiVersion: v1\nkind: Namespace\n")).unwrap();
        assert!(decl.header().name.is_none());
        assert_eq!(decl.header().display_name(), "Namespace/unnamed");
        assert!(decl.require_name().is_err());
    }

    #[test]
    fn test_parse_missing_kind() {
        let err = Declaration::parse(doc(3, "apiVersion: v1\nmetadata:\n  name: x\n")).unwrap_err();
        assert!(matches!(err, CoreError::MalformedDeclaration { index: 3, .. }));
        assert!(err.to_string().contains("missing kind"));
    }

    #[test]
    fn test_parse_missing_api_version() {
        let err = Declaration::parse(doc(1, "kind: Foo\n")).unwrap_err();
        assert!(err.to_string().contains("missing apiVersion"));
    }

    #[test]
    fn test_parse_scalar_document() {
        let err = Declaration::parse(doc(1, "just a string\n")).unwrap_err();
        assert!(matches!(err, CoreError::MalformedDeclaration { .. }));
    }

    #[test]
    fn test_object_is_decoded_lazily_and_cached() {
        let decl = Declaration::parse(doc(
            1,
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\ndata:\n  key: value\n",
        ))
        .unwrap();

        let first = decl.object().unwrap() as *const DynamicObject;
        let second = decl.object().unwrap() as *const DynamicObject;
        assert_eq!(first, second);

        let obj = decl.object().unwrap();
        assert_eq!(obj.metadata.name.as_deref(), Some("settings"));
        assert_eq!(obj.data["data"]["key"], "value");
    }
}
