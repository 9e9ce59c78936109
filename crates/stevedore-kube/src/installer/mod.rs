//! Per-declaration installers
//!
//! - [`SchemaObjectInstaller`]: get-or-create for CustomResourceDefinitions
//! - [`GenericObjectInstaller`]: discovery-resolved create for everything else

mod generic;
mod schema;

pub use generic::GenericObjectInstaller;
pub use schema::SchemaObjectInstaller;

use std::fmt;

/// What happened to one declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The object was created
    Created,
    /// A schema object was already present and left untouched
    Untouched,
    /// Create returned AlreadyExists and was counted as success
    ConflictSkip,
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyOutcome::Created => write!(f, "created"),
            ApplyOutcome::Untouched => write!(f, "unchanged"),
            ApplyOutcome::ConflictSkip => write!(f, "already exists"),
        }
    }
}

/// Summary of the declarations applied during one attempt
#[derive(Debug, Clone, Default)]
pub struct ApplySummary {
    /// Newly created resources
    pub created: Vec<String>,
    /// Resources left as they were, with the reason
    pub skipped: Vec<(String, ApplyOutcome)>,
}

impl ApplySummary {
    pub fn record(&mut self, name: String, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Created => self.created.push(name),
            other => self.skipped.push((name, other)),
        }
    }

    /// Format as human-readable summary
    pub fn summary(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if !self.created.is_empty() {
            parts.push(format!("{} created", self.created.len()));
        }
        if !self.skipped.is_empty() {
            parts.push(format!("{} skipped", self.skipped.len()));
        }
        if parts.is_empty() {
            "No resources processed".to_string()
        } else {
            parts.join(", ")
        }
    }
}
