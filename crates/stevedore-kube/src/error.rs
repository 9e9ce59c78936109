//! Error types for stevedore-kube
//!
//! [`KubeError`] describes a failed cluster call. [`InstallError`] is the
//! taxonomy of reasons an installation attempt stops; its message is what
//! ends up in `status.error`.

use stevedore_core::{BundleKind, CoreError};
use stevedore_engine::EngineError;
use stevedore_repo::RepoError;
use thiserror::Error;

/// Result type for cluster operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur during Kubernetes operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// Object does not exist
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Object with the same name already exists
    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    /// Write rejected because the object changed since it was read
    #[error("conflict writing {resource}: {message}")]
    Conflict { resource: String, message: String },

    /// Request rejected by the API server
    #[error("{resource} rejected: {message}")]
    Rejected { resource: String, message: String },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for KubeError {
    fn from(e: serde_json::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for KubeError {
    fn from(e: serde_yaml::Error) -> Self {
        KubeError::Serialization(e.to_string())
    }
}

impl KubeError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        match self {
            KubeError::NotFound { .. } => true,
            KubeError::Api(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }

    /// Check if a create failed because the object is already there
    pub fn is_already_exists(&self) -> bool {
        match self {
            KubeError::AlreadyExists { .. } => true,
            KubeError::Api(kube::Error::Api(resp)) => {
                resp.code == 409 && resp.reason == "AlreadyExists"
            }
            _ => false,
        }
    }

    /// Check if this is a write conflict (409 other than AlreadyExists)
    pub fn is_conflict(&self) -> bool {
        match self {
            KubeError::Conflict { .. } => true,
            KubeError::Api(kube::Error::Api(resp)) => {
                resp.code == 409 && resp.reason != "AlreadyExists"
            }
            _ => false,
        }
    }
}

/// Why an installation attempt stopped
#[derive(Debug, Error)]
pub enum InstallError {
    /// The Installation itself is unusable (e.g. empty URL); nothing was fetched
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("failed to fetch bundle: {0}")]
    Fetch(#[source] RepoError),

    #[error("failed to parse bundle: {0}")]
    Parse(#[from] CoreError),

    /// No REST location for the declared group/version/kind
    #[error("no REST mapping for kind '{kind}' (group '{group}', version '{version}')")]
    Mapping {
        group: String,
        version: String,
        kind: String,
    },

    #[error("failed to apply {resource}: {source}")]
    Apply {
        resource: String,
        #[source]
        source: KubeError,
    },

    #[error("failed to render overlay: {0}")]
    Render(#[from] EngineError),

    #[error("bundle kind '{kind}': implementation not available")]
    Unsupported { kind: BundleKind },

    #[error("API discovery failed: {0}")]
    Discovery(#[source] KubeError),

    /// Reading or persisting the Installation failed
    #[error("status of installation '{name}' unavailable: {source}")]
    Status {
        name: String,
        #[source]
        source: KubeError,
    },
}

impl From<RepoError> for InstallError {
    fn from(e: RepoError) -> Self {
        if e.is_validation() {
            InstallError::Validation {
                field: "spec.url".to_string(),
                message: e.to_string(),
            }
        } else {
            InstallError::Fetch(e)
        }
    }
}

impl InstallError {
    /// Short category name for structured logs
    pub fn category(&self) -> &'static str {
        match self {
            InstallError::Validation { .. } => "validation",
            InstallError::Fetch(_) => "fetch",
            InstallError::Parse(_) => "parse",
            InstallError::Mapping { .. } => "mapping",
            InstallError::Apply { .. } => "apply",
            InstallError::Render(_) => "render",
            InstallError::Unsupported { .. } => "unsupported",
            InstallError::Discovery(_) => "discovery",
            InstallError::Status { .. } => "status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> KubeError {
        KubeError::Api(kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: reason.to_string(),
            code,
        }))
    }

    #[test]
    fn test_api_error_predicates() {
        assert!(api_error(404, "NotFound").is_not_found());
        assert!(api_error(409, "AlreadyExists").is_already_exists());
        assert!(!api_error(409, "AlreadyExists").is_conflict());
        assert!(api_error(409, "Conflict").is_conflict());
        assert!(!api_error(409, "Conflict").is_already_exists());
        assert!(!api_error(500, "InternalError").is_not_found());
    }

    #[test]
    fn test_local_error_predicates() {
        let err = KubeError::AlreadyExists {
            resource: "ConfigMap/a".to_string(),
        };
        assert!(err.is_already_exists());
        assert!(!err.is_not_found());

        let err = KubeError::NotFound {
            resource: "Installation/x".to_string(),
        };
        assert!(err.is_not_found());
    }

    #[test]
    fn test_empty_url_maps_to_validation() {
        let err: InstallError = RepoError::EmptyUrl.into();
        assert!(matches!(err, InstallError::Validation { .. }));
        assert_eq!(err.category(), "validation");
        assert!(err.to_string().contains("spec.url"));
    }

    #[test]
    fn test_unparseable_url_maps_to_fetch() {
        let err: InstallError = RepoError::InvalidUrl {
            url: "not a url".to_string(),
            reason: "relative URL without a base".to_string(),
        }
        .into();
        assert!(matches!(err, InstallError::Fetch(RepoError::InvalidUrl { .. })));
        assert_eq!(err.category(), "fetch");
    }

    #[test]
    fn test_transport_failure_maps_to_fetch() {
        let err: InstallError = RepoError::HttpError {
            status: 404,
            message: "Not Found".to_string(),
        }
        .into();
        assert!(matches!(err, InstallError::Fetch(_)));
    }

    #[test]
    fn test_unsupported_message() {
        let err = InstallError::Unsupported {
            kind: BundleKind::PackagedChart,
        };
        assert_eq!(
            err.to_string(),
            "bundle kind 'packaged-chart': implementation not available"
        );
    }
}
