//! Operator error types with exit code handling

use miette::Diagnostic;
use stevedore_core::CoreError;
use stevedore_kube::{InstallError, KubeError};
use stevedore_repo::RepoError;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum OperatorError {
    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(stevedore::operator::config),
        help("check the file given with --config or STEVEDORE_CONFIG")
    )]
    Config { message: String },

    #[error("Cluster error: {message}")]
    #[diagnostic(code(stevedore::operator::cluster))]
    Cluster {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// One-shot reconcile ended in a failed attempt or could not persist status
    #[error("Reconcile of '{name}' failed: {message}")]
    #[diagnostic(code(stevedore::operator::reconcile))]
    Reconcile { name: String, message: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(stevedore::operator::internal))]
    Internal { message: String },
}

impl OperatorError {
    pub fn exit_code(&self) -> i32 {
        match self {
            OperatorError::Config { .. } => exit_codes::CONFIG_ERROR,
            OperatorError::Cluster { .. } => exit_codes::CLUSTER_ERROR,
            OperatorError::Reconcile { .. } => exit_codes::RECONCILE_FAILED,
            OperatorError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn reconcile(name: &str, error: impl ToString) -> Self {
        Self::Reconcile {
            name: name.to_string(),
            message: error.to_string(),
        }
    }
}

impl From<CoreError> for OperatorError {
    fn from(e: CoreError) -> Self {
        OperatorError::Config {
            message: e.to_string(),
        }
    }
}

impl From<KubeError> for OperatorError {
    fn from(e: KubeError) -> Self {
        let help = if e.is_not_found() {
            Some("install the CRD with `stevedore-operator crd | kubectl apply -f -`".to_string())
        } else {
            None
        };
        OperatorError::Cluster {
            message: e.to_string(),
            help,
        }
    }
}

impl From<RepoError> for OperatorError {
    fn from(e: RepoError) -> Self {
        OperatorError::internal(e.to_string())
    }
}

impl From<serde_yaml::Error> for OperatorError {
    fn from(e: serde_yaml::Error) -> Self {
        OperatorError::internal(format!("failed to serialize CRD: {}", e))
    }
}

impl From<InstallError> for OperatorError {
    fn from(e: InstallError) -> Self {
        match e {
            InstallError::Status { name, source } => OperatorError::reconcile(&name, source),
            other => OperatorError::internal(other.to_string()),
        }
    }
}
