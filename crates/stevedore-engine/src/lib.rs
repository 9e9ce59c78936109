//! Stevedore Engine - Overlay rendering
//!
//! Turns an overlay descriptor (a kustomization) into flat declarations:
//! - `OverlayRenderer`: materializes the descriptor and runs the build step
//! - `KustomizeBuilder`: the external `kustomize build` step
//! - `split_on_marker`: splits the rendered stream on `---`

pub mod error;
pub mod overlay;

pub use error::{EngineError, Result};
pub use overlay::{
    DOCUMENT_MARKER, KUSTOMIZATION_FILE, KustomizeBuilder, OverlayBuilder, OverlayRenderer,
    split_on_marker,
};
