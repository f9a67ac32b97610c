//! Simdex: Multimodal Embedding Store and Similarity Retrieval
//!
//! An embedding-indexed retrieval service for heterogeneous content:
//! - Named collections with fixed-dimension vector columns and HNSW
//!   similarity indexes (USearch over sled row storage)
//! - Pluggable embedding providers per modality (OpenAI-compatible HTTP
//!   text embeddings, local ONNX image embeddings)
//! - Nearest-neighbor queries with bounded similarity scores for cosine
//!   and Euclidean metrics
//! - REST API for collection management, insertion, and retrieval

pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod server;
pub mod store;
pub mod types;

pub use config::Config;
pub use engine::RetrievalEngine;
pub use error::{Error, Result};
pub use store::{Metric, VectorStore};
pub use types::*;
