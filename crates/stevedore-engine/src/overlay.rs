//! Overlay bundle rendering
//!
//! An overlay descriptor is a kustomization. Rendering writes it into a fresh
//! temporary directory, hands that directory to an external build step and
//! returns the flattened multi-document output. The directory is removed when
//! rendering finishes, successfully or not.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;

use crate::error::{EngineError, Result};

/// File name the descriptor is written to inside the overlay directory
pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

/// Marker the rendered stream is split on
pub const DOCUMENT_MARKER: &[u8] = b"---";

/// External step that flattens an overlay directory into one YAML stream
#[async_trait]
pub trait OverlayBuilder: Send + Sync {
    async fn build(&self, dir: &Path) -> Result<Vec<u8>>;
}

/// Runs `<binary> build <dir>` and captures stdout
#[derive(Debug, Clone)]
pub struct KustomizeBuilder {
    binary: PathBuf,
}

impl KustomizeBuilder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Default for KustomizeBuilder {
    fn default() -> Self {
        Self::new("kustomize")
    }
}

#[async_trait]
impl OverlayBuilder for KustomizeBuilder {
    async fn build(&self, dir: &Path) -> Result<Vec<u8>> {
        let output = tokio::process::Command::new(&self.binary)
            .arg("build")
            .arg(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| EngineError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(EngineError::BuildFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

/// Renders overlay descriptors through an [`OverlayBuilder`]
pub struct OverlayRenderer<B: OverlayBuilder> {
    builder: B,
}

impl<B: OverlayBuilder> OverlayRenderer<B> {
    pub fn new(builder: B) -> Self {
        Self { builder }
    }

    /// Materialize `descriptor` and build it into a single YAML stream
    pub async fn render(&self, descriptor: &[u8]) -> Result<Vec<u8>> {
        let dir = tempfile::Builder::new()
            .prefix("overlay-")
            .tempdir()
            .map_err(EngineError::Materialize)?;

        let target = dir.path().join(KUSTOMIZATION_FILE);
        tokio::fs::write(&target, descriptor)
            .await
            .map_err(EngineError::Materialize)?;

        tracing::debug!(dir = %dir.path().display(), "Materialized overlay");

        let rendered = self.builder.build(dir.path()).await?;

        tracing::debug!(bytes = rendered.len(), "Rendered overlay");
        Ok(rendered)
    }
}

/// Split a rendered stream on every `---` occurrence
///
/// Chunks that are empty or whitespace-only are dropped. The marker is matched
/// anywhere in the stream, not only at line starts.
pub fn split_on_marker(stream: &[u8]) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i + DOCUMENT_MARKER.len() <= stream.len() {
        if &stream[i..i + DOCUMENT_MARKER.len()] == DOCUMENT_MARKER {
            push_chunk(&mut chunks, &stream[start..i]);
            i += DOCUMENT_MARKER.len();
            start = i;
        } else {
            i += 1;
        }
    }
    push_chunk(&mut chunks, &stream[start..]);

    chunks
}

fn push_chunk(chunks: &mut Vec<Vec<u8>>, chunk: &[u8]) {
    if chunk.iter().any(|b| !b.is_ascii_whitespace()) {
        chunks.push(chunk.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(chunks: &[Vec<u8>]) -> Vec<String> {
        chunks
            .iter()
            .map(|c| String::from_utf8_lossy(c).trim().to_string())
            .collect()
    }

    #[test]
    fn test_split_on_marker() {
        let stream = b"kind: A\n---\nkind: B\n---\nkind: C\n";
        assert_eq!(
            texts(&split_on_marker(stream)),
            vec!["kind: A", "kind: B", "kind: C"]
        );
    }

    #[test]
    fn test_split_drops_blank_chunks() {
        let stream = b"---\n\n---\nkind: A\n---\n   \n";
        assert_eq!(texts(&split_on_marker(stream)), vec!["kind: A"]);
    }

    #[test]
    fn test_split_empty_stream() {
        assert!(split_on_marker(b"").is_empty());
        assert!(split_on_marker(b"---").is_empty());
    }

    #[test]
    fn test_split_matches_marker_inside_values() {
        // Naive marker matching also cuts inside scalars
        let stream = b"kind: A\ndata: a---b\n";
        assert_eq!(split_on_marker(stream).len(), 2);
    }

    #[test]
    fn test_kustomize_builder_default_binary() {
        assert_eq!(KustomizeBuilder::default().binary(), Path::new("kustomize"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let builder = KustomizeBuilder::new("/nonexistent/kustomize");
        let dir = tempfile::tempdir().unwrap();
        let err = builder.build(dir.path()).await.unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/kustomize"));
    }
}
