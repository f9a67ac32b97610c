//! Embedding provider trait definition
//!
//! All providers expose the same contract regardless of modality, so the
//! retrieval engine can drive any of them through `dyn EmbeddingProvider`.

use crate::error::Result;
use crate::types::{ContentRef, Embedding, Modality};

/// Converts raw content into a fixed-length numeric vector
///
/// Implementations are deterministic for deterministic input (up to backend
/// numeric nondeterminism) and produce vectors of exactly `dimensions()`
/// elements. A provider handed content of another modality fails with
/// `UnsupportedContentKind` instead of guessing.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for one content reference
    fn embed(&self, content: &ContentRef) -> Result<Embedding>;

    /// Fixed output dimensionality of this provider instance
    fn dimensions(&self) -> usize;

    /// The content modality this provider serves
    fn modality(&self) -> Modality;

    /// Provider name for diagnostics (e.g. "http-text", "clip-onnx")
    fn name(&self) -> &str;
}
