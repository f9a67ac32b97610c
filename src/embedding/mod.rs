//! Embedding providers for the supported modalities
//!
//! Text embeddings come from an OpenAI-compatible HTTP API:
//! - OpenAI, Azure OpenAI
//! - vLLM, Ollama, LM Studio, text-embeddings-inference
//!
//! Image embeddings come from a local ONNX vision encoder (CLIP-style)
//! running on ONNX Runtime. Enable the `cuda` feature for GPU acceleration.
//!
//! # Example Configuration
//!
//! ```toml
//! [embedding.text]
//! endpoint = "https://api.openai.com/v1/embeddings"
//! model = "text-embedding-3-small"
//! dimensions = 1536
//!
//! [embedding.image]
//! model_path = ".simdex/models/clip-vit-base-patch32/model.onnx"
//! dimensions = 512
//! ```

mod factory;
mod image;
mod loader;
mod text;
mod traits;

pub use factory::{create_image_provider, create_text_provider};
pub use image::ClipImageProvider;
pub use loader::ImageSource;
pub use text::HttpTextProvider;
pub use traits::EmbeddingProvider;
