//! HTTP API request handlers
//!
//! Handlers that map HTTP requests onto store and engine operations.
//! Collection and column names are structural identifiers, so they are
//! restricted here before they reach the core.

use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::engine::RetrievalEngine;
use crate::store::Metric;
use crate::types::ContentRef;

use super::types::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RetrievalEngine>,
    /// Durable staging area for uploaded files
    pub upload_dir: PathBuf,
}

/// Reject names that are not safe structural identifiers
fn validate_identifier(name: &str) -> Result<(), ApiError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if name.len() <= 64 => {
            (first.is_ascii_alphanumeric() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "invalid identifier {name:?}: use [A-Za-z0-9_][A-Za-z0-9_-]* (max 64 chars)"
        )))
    }
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a collection (idempotent)
pub async fn create_collection(
    State(state): State<AppState>,
    Json(request): Json<CreateCollectionRequest>,
) -> Result<Json<CreateCollectionResponse>, ApiError> {
    debug!(
        collection = %request.name,
        dimension = request.dimension,
        "HTTP create collection"
    );
    validate_identifier(&request.name)?;
    validate_identifier(&request.content_column)?;
    if request.dimension == 0 {
        return Err(ApiError::bad_request("dimension must be positive"));
    }
    let metric = Metric::parse(&request.metric)?;

    state.engine.store().create_collection(
        &request.name,
        &request.content_column,
        request.dimension,
        metric,
    )?;

    Ok(Json(CreateCollectionResponse {
        status: "index_created".to_string(),
        collection: request.name,
    }))
}

/// Insert a caller-supplied embedding
pub async fn insert_entry(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<InsertEntryRequest>,
) -> Result<Json<InsertResponse>, ApiError> {
    debug!(collection = %name, "HTTP insert entry");
    validate_identifier(&name)?;
    validate_identifier(&request.content_column)?;

    let id = state.engine.store().insert(
        &name,
        &request.content_column,
        &request.content,
        &request.embedding,
    )?;

    Ok(Json(InsertResponse {
        status: "item_added".to_string(),
        id,
    }))
}

/// Query with a caller-supplied embedding
pub async fn query(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    debug!(collection = %name, top_k = request.top_k, "HTTP query");
    validate_identifier(&name)?;
    validate_identifier(&request.content_column)?;
    let metric = Metric::parse(&request.metric)?;

    let results = state.engine.store().query(
        &name,
        &request.content_column,
        &request.query_embedding,
        request.top_k,
        metric,
    )?;

    Ok(Json(QueryResponse {
        status: "success".to_string(),
        results,
    }))
}

/// Embed text with the configured provider, then insert
pub async fn add_text(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<AddTextRequest>,
) -> Result<Json<InsertResponse>, ApiError> {
    debug!(collection = %name, "HTTP add text");
    validate_identifier(&name)?;
    validate_identifier(&request.content_column)?;

    let engine = state.engine.clone();
    let id = tokio::task::spawn_blocking(move || {
        engine.add_content(
            &name,
            &request.content_column,
            ContentRef::Text(request.content),
        )
    })
    .await
    .map_err(|e| ApiError::from(crate::Error::Backend(anyhow::anyhow!("task failed: {e}"))))??;

    Ok(Json(InsertResponse {
        status: "item_added".to_string(),
        id,
    }))
}

/// Embed query text with the configured provider, then search
pub async fn query_text(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<QueryTextRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    debug!(collection = %name, top_k = request.top_k, "HTTP query text");
    validate_identifier(&name)?;
    validate_identifier(&request.content_column)?;
    let metric = Metric::parse(&request.metric)?;

    let engine = state.engine.clone();
    let results = tokio::task::spawn_blocking(move || {
        engine.query_content(
            &name,
            &request.content_column,
            ContentRef::Text(request.query),
            request.top_k,
            metric,
        )
    })
    .await
    .map_err(|e| ApiError::from(crate::Error::Backend(anyhow::anyhow!("task failed: {e}"))))??;

    Ok(Json(QueryResponse {
        status: "success".to_string(),
        results,
    }))
}

/// Upload an image, stage it under the data directory, embed, and insert
///
/// Multipart fields: `file` (required) and `content_column` (optional,
/// defaults to "content"). The staged path is what gets stored as the
/// entry's content, so the row remains resolvable later.
pub async fn add_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<AddImageResponse>, ApiError> {
    debug!(collection = %name, "HTTP add image");
    validate_identifier(&name)?;

    let mut content_column = "content".to_string();
    let mut staged: Option<PathBuf> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        let field_name = field.name().map(|s| s.to_string());
        match field_name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .and_then(|f| f.rsplit(['/', '\\']).next())
                    .filter(|f| !f.is_empty())
                    .unwrap_or("upload.bin")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
                if bytes.is_empty() {
                    return Err(ApiError::bad_request("empty file upload"));
                }

                let path = state
                    .upload_dir
                    .join(format!("{}-{filename}", Uuid::new_v4()));
                std::fs::write(&path, &bytes).map_err(|e| {
                    ApiError::from(crate::Error::Backend(anyhow::anyhow!(
                        "failed to stage upload: {e}"
                    )))
                })?;
                staged = Some(path);
            }
            Some("content_column") => {
                content_column = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid content_column: {e}")))?;
            }
            _ => {}
        }
    }

    let Some(path) = staged else {
        return Err(ApiError::bad_request("missing 'file' field"));
    };
    validate_identifier(&content_column)?;

    let engine = state.engine.clone();
    let staged_path = path.clone();
    let id = tokio::task::spawn_blocking(move || {
        engine.add_content(&name, &content_column, ContentRef::image_path(staged_path))
    })
    .await
    .map_err(|e| ApiError::from(crate::Error::Backend(anyhow::anyhow!("task failed: {e}"))))??;

    Ok(Json(AddImageResponse {
        status: "item_added".to_string(),
        id,
        stored_path: path.display().to_string(),
    }))
}

/// Embed a query image (path or URL reference), then search
pub async fn query_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<QueryImageRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    debug!(collection = %name, reference = %request.reference, "HTTP query image");
    validate_identifier(&name)?;
    validate_identifier(&request.content_column)?;
    if request.reference.is_empty() {
        return Err(ApiError::bad_request("empty image reference"));
    }
    let metric = Metric::parse(&request.metric)?;

    let engine = state.engine.clone();
    let results = tokio::task::spawn_blocking(move || {
        engine.query_content(
            &name,
            &request.content_column,
            ContentRef::image(&request.reference),
            request.top_k,
            metric,
        )
    })
    .await
    .map_err(|e| ApiError::from(crate::Error::Backend(anyhow::anyhow!("task failed: {e}"))))??;

    Ok(Json(QueryResponse {
        status: "success".to_string(),
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_accepts_sane_names() {
        assert!(validate_identifier("docs").is_ok());
        assert!(validate_identifier("image_paths").is_ok());
        assert!(validate_identifier("col-2024").is_ok());
        assert!(validate_identifier("_private").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_structural_abuse() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("docs; drop table users").is_err());
        assert!(validate_identifier("a/b").is_err());
        assert!(validate_identifier("-leading-dash").is_err());
        assert!(validate_identifier(&"x".repeat(65)).is_err());
        assert!(validate_identifier(&"x".repeat(64)).is_ok());
    }
}
