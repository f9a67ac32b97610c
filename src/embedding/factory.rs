//! Provider construction from configuration

use std::sync::Arc;
use tracing::info;

use super::image::ClipImageProvider;
use super::text::HttpTextProvider;
use super::traits::EmbeddingProvider;
use crate::config::{ImageEmbeddingConfig, TextEmbeddingConfig};
use crate::error::Result;

/// Create the text embedding provider
///
/// Returns an `Arc<dyn EmbeddingProvider>` that can be shared across threads.
pub fn create_text_provider(config: &TextEmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    info!(endpoint = %config.endpoint, "creating text embedding provider");
    let provider = HttpTextProvider::new(config)?;
    Ok(Arc::new(provider))
}

/// Create the image embedding provider
///
/// Fails with `ModelUnavailable` when the model weights cannot be loaded.
pub fn create_image_provider(config: &ImageEmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    info!(model = ?config.model_path, "creating image embedding provider");
    let provider = ClipImageProvider::new(config)?;
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Modality;

    #[test]
    fn test_create_text_provider() {
        let config = TextEmbeddingConfig {
            endpoint: "http://localhost:8080/v1/embeddings".to_string(),
            api_key: None,
            model: "test-model".to_string(),
            dimensions: 384,
            timeout_secs: 30,
        };

        // Creating the provider builds the client without making requests
        let provider = create_text_provider(&config).unwrap();
        assert_eq!(provider.name(), "http-text");
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.modality(), Modality::Text);
    }
}
