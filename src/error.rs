//! Error taxonomy for the retrieval engine
//!
//! Every public operation either returns a well-formed result or fails with
//! one of these kinds. Storage and inference failures that have no more
//! specific classification surface as `Backend`.

use crate::types::Modality;

/// Errors surfaced by the store, the embedding providers, and the engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The content reference cannot be handled by the addressed provider
    #[error("unsupported content kind: {0}")]
    UnsupportedContentKind(String),

    /// The referenced resource could not be fetched or decoded
    #[error("failed to load content: {0}")]
    ContentLoad(String),

    /// The inference backend could not be initialized
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// The metric name is not one of the supported distance families
    #[error("invalid metric: {0:?} (expected \"cosine\" or \"euclidean\")")]
    InvalidMetric(String),

    /// The embedding length does not match the collection dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The collection has not been created
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// No embedding provider is configured for the content's modality
    #[error("no embedding provider configured for {0} content")]
    ProviderRequired(Modality),

    /// Storage or inference failure not otherwise classified
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Result type for retrieval operations
pub type Result<T> = std::result::Result<T, Error>;
