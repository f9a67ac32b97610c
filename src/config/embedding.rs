//! Embedding provider configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default timeout for HTTP embedding requests
fn default_timeout() -> u64 {
    30
}

fn default_text_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_text_dimensions() -> usize {
    1536
}

fn default_image_model_name() -> String {
    "clip-vit-base-patch32".to_string()
}

fn default_image_dimensions() -> usize {
    512
}

fn default_image_size() -> u32 {
    224
}

fn default_num_threads() -> usize {
    4
}

/// Per-modality provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Text provider (OpenAI-compatible HTTP endpoint); absent means the
    /// text modality is not served
    #[serde(default)]
    pub text: Option<TextEmbeddingConfig>,
    /// Image provider (local ONNX model); absent means the image modality
    /// is not served
    #[serde(default)]
    pub image: Option<ImageEmbeddingConfig>,
}

/// Text embeddings via an OpenAI-compatible HTTP API
///
/// ```toml
/// [embedding.text]
/// endpoint = "https://api.openai.com/v1/embeddings"
/// model = "text-embedding-3-small"
/// dimensions = 1536
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextEmbeddingConfig {
    /// API endpoint URL (e.g., "https://api.openai.com/v1/embeddings")
    pub endpoint: String,
    /// API key (optional, can also use the OPENAI_API_KEY env var)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name sent with each request
    #[serde(default = "default_text_model")]
    pub model: String,
    /// Embedding dimensions
    #[serde(default = "default_text_dimensions")]
    pub dimensions: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Image embeddings via a local ONNX vision encoder
///
/// ```toml
/// [embedding.image]
/// model_path = ".simdex/models/clip-vit-base-patch32/model.onnx"
/// dimensions = 512
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEmbeddingConfig {
    /// Model name, used to resolve weights under the data directory
    #[serde(default = "default_image_model_name")]
    pub model_name: String,
    /// Path to the ONNX model file (resolved from the data dir if absent)
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// Embedding dimensions
    #[serde(default = "default_image_dimensions")]
    pub dimensions: usize,
    /// Side length of the square input the model expects
    #[serde(default = "default_image_size")]
    pub image_size: u32,
    /// Number of threads for inference
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
    /// Use GPU acceleration when the `cuda` feature is enabled
    #[serde(default)]
    pub use_gpu: bool,
    /// GPU device ID
    #[serde(default)]
    pub gpu_device_id: usize,
}

impl Default for ImageEmbeddingConfig {
    fn default() -> Self {
        Self {
            model_name: default_image_model_name(),
            model_path: None,
            dimensions: default_image_dimensions(),
            image_size: default_image_size(),
            num_threads: default_num_threads(),
            use_gpu: false,
            gpu_device_id: 0,
        }
    }
}

impl ImageEmbeddingConfig {
    /// Resolve the model path from the data directory when not set
    /// explicitly and the conventional file exists
    pub fn resolve_paths(&mut self, data_dir: &std::path::Path) {
        if self.model_path.is_none() {
            let candidate = data_dir
                .join("models")
                .join(&self.model_name)
                .join("model.onnx");
            if candidate.exists() {
                self.model_path = Some(candidate);
            }
        }
    }
}
