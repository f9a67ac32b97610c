//! Retrieval engine: embed, then store or search
//!
//! Composes embedding providers with the vector store. This is the only
//! layer that sequences "embed, then insert" and "embed, then query"; it
//! owns no state beyond the references to its collaborators.

use std::sync::Arc;
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::store::{Metric, VectorStore};
use crate::types::{ContentRef, Modality, ScoredEntry};

pub struct RetrievalEngine {
    store: Arc<VectorStore>,
    text: Option<Arc<dyn EmbeddingProvider>>,
    image: Option<Arc<dyn EmbeddingProvider>>,
}

impl RetrievalEngine {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self {
            store,
            text: None,
            image: None,
        }
    }

    pub fn with_text_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.text = Some(provider);
        self
    }

    pub fn with_image_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.image = Some(provider);
        self
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    fn provider_for(&self, modality: Modality) -> Result<&Arc<dyn EmbeddingProvider>> {
        let provider = match modality {
            Modality::Text => self.text.as_ref(),
            Modality::Image => self.image.as_ref(),
        };
        provider.ok_or(Error::ProviderRequired(modality))
    }

    /// Embed the content and insert it, returning the generated id
    ///
    /// A failed embed leaves the store untouched; nothing is written until
    /// the provider has produced a vector.
    pub fn add_content(
        &self,
        collection_name: &str,
        content_column: &str,
        content: ContentRef,
    ) -> Result<u64> {
        let provider = self.provider_for(content.modality())?;
        let embedding = provider.embed(&content)?;
        let payload = content.payload();
        debug!(
            collection = collection_name,
            provider = provider.name(),
            "adding embedded content"
        );
        self.store
            .insert(collection_name, content_column, &payload, &embedding)
    }

    /// Embed the query content and retrieve the nearest entries
    pub fn query_content(
        &self,
        collection_name: &str,
        content_column: &str,
        query: ContentRef,
        top_k: usize,
        metric: Metric,
    ) -> Result<Vec<ScoredEntry>> {
        let provider = self.provider_for(query.modality())?;
        let embedding = provider.embed(&query)?;
        self.store
            .query(collection_name, content_column, &embedding, top_k, metric)
    }
}
