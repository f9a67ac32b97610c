//! Text embedding via an OpenAI-compatible HTTP API
//!
//! Works with the OpenAI API, Azure OpenAI, and local servers speaking the
//! same protocol (LM Studio, vLLM, Ollama compat mode,
//! text-embeddings-inference). Vectors are stored exactly as the provider
//! returns them; no normalization is applied on this path.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::traits::EmbeddingProvider;
use crate::config::TextEmbeddingConfig;
use crate::error::{Error, Result};
use crate::types::{ContentRef, Embedding, Modality};

/// Text embedding provider backed by an OpenAI-compatible endpoint
pub struct HttpTextProvider {
    client: Client,
    config: TextEmbeddingConfig,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
    encoding_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl HttpTextProvider {
    /// Create a new provider from configuration
    pub fn new(config: &TextEmbeddingConfig) -> Result<Self> {
        info!(
            endpoint = %config.endpoint,
            model = %config.model,
            "initializing HTTP text embedding provider"
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // API key from config or environment
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());

        if let Some(key) = &api_key {
            let auth_value = format!("Bearer {key}");
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value).map_err(|e| {
                    Error::ModelUnavailable(format!("invalid API key format: {e}"))
                })?,
            );
        } else if config.endpoint.contains("openai.com") || config.endpoint.contains("azure.com") {
            warn!("no API key provided for {}", config.endpoint);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::ModelUnavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn request_embedding(&self, text: &str) -> Result<Embedding> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: vec![text],
            // Only models that accept a dimensions override get one
            dimensions: if self.config.model.contains("text-embedding-3") {
                Some(self.config.dimensions)
            } else {
                None
            },
            encoding_format: "float",
        };

        debug!(endpoint = %self.config.endpoint, "requesting text embedding");

        // The blocking client panics when driven from inside a tokio
        // runtime, so the request runs on a scoped thread.
        let body = serde_json::to_vec(&request)
            .map_err(|e| anyhow::anyhow!("failed to serialize embedding request: {e}"))?;

        let response = std::thread::scope(|s| {
            s.spawn(|| {
                self.client
                    .post(&self.config.endpoint)
                    .header(CONTENT_TYPE, "application/json")
                    .body(body)
                    .send()
            })
            .join()
        })
        .map_err(|_| anyhow::anyhow!("embedding request thread panicked"))?
        .map_err(|e| anyhow::anyhow!("embedding request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .unwrap_or_else(|_| "unknown error".to_string());
            if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(&error_text) {
                return Err(Error::Backend(anyhow::anyhow!(
                    "embedding API error ({status}): {}",
                    parsed.error.message
                )));
            }
            return Err(Error::Backend(anyhow::anyhow!(
                "embedding API error ({status}): {error_text}"
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| anyhow::anyhow!("failed to parse embedding response: {e}"))?;
        parsed.data.sort_by_key(|d| d.index);

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| anyhow::anyhow!("embedding API returned no vectors"))?;

        if embedding.len() != self.config.dimensions {
            return Err(Error::Backend(anyhow::anyhow!(
                "embedding API returned {} dimensions, expected {}",
                embedding.len(),
                self.config.dimensions
            )));
        }

        Ok(embedding)
    }
}

impl EmbeddingProvider for HttpTextProvider {
    fn embed(&self, content: &ContentRef) -> Result<Embedding> {
        match content {
            ContentRef::Text(text) => self.request_embedding(text),
            ContentRef::Image(_) => Err(Error::UnsupportedContentKind(
                "text provider cannot embed image content".to_string(),
            )),
        }
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn modality(&self) -> Modality {
        Modality::Text
    }

    fn name(&self) -> &str {
        "http-text"
    }
}
