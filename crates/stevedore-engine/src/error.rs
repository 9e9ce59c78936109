//! Error types for overlay rendering

use std::path::PathBuf;

use thiserror::Error;

/// Result type for overlay rendering
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while rendering an overlay bundle
#[derive(Debug, Error)]
pub enum EngineError {
    /// The temporary overlay layout could not be written
    #[error("unable to materialize overlay: {0}")]
    Materialize(#[source] std::io::Error),

    /// The build executable could not be started
    #[error("unable to run '{}': {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The build step ran and failed
    #[error("overlay build failed ({status}): {stderr}")]
    BuildFailed { status: String, stderr: String },
}
