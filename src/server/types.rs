//! HTTP API request/response types
//!
//! JSON-serializable types for the HTTP API, plus the error-kind to
//! status-code mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::ScoredEntry;

fn default_top_k() -> usize {
    5
}

fn default_metric() -> String {
    "cosine".to_string()
}

fn default_content_column() -> String {
    "content".to_string()
}

/// Create-collection request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    #[serde(default = "default_content_column")]
    pub content_column: String,
    pub dimension: usize,
    #[serde(default = "default_metric")]
    pub metric: String,
}

/// Create-collection response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCollectionResponse {
    pub status: String,
    pub collection: String,
}

/// Raw-embedding insert request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertEntryRequest {
    #[serde(default = "default_content_column")]
    pub content_column: String,
    pub content: String,
    pub embedding: Vec<f64>,
}

/// Insert response with the generated id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertResponse {
    pub status: String,
    pub id: u64,
}

/// Raw-embedding query request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default = "default_content_column")]
    pub content_column: String,
    pub query_embedding: Vec<f64>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_metric")]
    pub metric: String,
}

/// Text add request body (embed, then insert)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTextRequest {
    #[serde(default = "default_content_column")]
    pub content_column: String,
    pub content: String,
}

/// Text query request body (embed, then search)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTextRequest {
    #[serde(default = "default_content_column")]
    pub content_column: String,
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_metric")]
    pub metric: String,
}

/// Image query request body; `ref` is a local path or http(s) URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryImageRequest {
    #[serde(default = "default_content_column")]
    pub content_column: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_metric")]
    pub metric: String,
}

/// Image upload response: generated id plus the staged path that was stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddImageResponse {
    pub status: String,
    pub id: u64,
    pub stored_path: String,
}

/// Query response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub status: String,
    pub results: Vec<ScoredEntry>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new("UNAUTHORIZED", "Invalid or missing API key")
    }
}

/// An error ready to leave the HTTP boundary
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse::new("BAD_REQUEST", message),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::UnsupportedContentKind(_) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_CONTENT_KIND")
            }
            Error::InvalidMetric(_) => (StatusCode::BAD_REQUEST, "INVALID_METRIC"),
            Error::DimensionMismatch { .. } => (StatusCode::BAD_REQUEST, "DIMENSION_MISMATCH"),
            Error::UnknownCollection(_) => (StatusCode::NOT_FOUND, "UNKNOWN_COLLECTION"),
            Error::ContentLoad(_) => (StatusCode::UNPROCESSABLE_ENTITY, "CONTENT_LOAD_ERROR"),
            Error::ModelUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "MODEL_UNAVAILABLE"),
            Error::ProviderRequired(_) => (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_REQUIRED"),
            Error::Backend(_) => (StatusCode::INTERNAL_SERVER_ERROR, "BACKEND_ERROR"),
        };
        Self {
            status,
            body: ErrorResponse::new(code, err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
