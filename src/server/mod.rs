//! HTTP API server
//!
//! Axum-based REST API over the retrieval engine: collection management,
//! raw-embedding insert/query, and embed-then-store/search per modality.
//! Request parsing, name restriction, multipart staging, and error-kind to
//! status-code translation all live here; the core stays a plain
//! function-call contract.

mod auth;
mod handlers;
mod routes;
mod types;

pub use auth::AuthState;
pub use handlers::AppState;
pub use routes::create_router;
pub use types::{ApiError, ErrorResponse};

use anyhow::{Context, Result};
use axum::http::Method;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::HttpConfig;
use crate::engine::RetrievalEngine;

/// HTTP API server
pub struct HttpServer {
    config: HttpConfig,
    engine: Arc<RetrievalEngine>,
}

impl HttpServer {
    pub fn new(config: HttpConfig, engine: Arc<RetrievalEngine>) -> Self {
        Self { config, engine }
    }

    /// Run the server until ctrl-c
    pub async fn run(&self, data_dir: &Path) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .context("Invalid HTTP listen address")?;

        let upload_dir = data_dir.join("uploads");
        std::fs::create_dir_all(&upload_dir).context("Failed to create upload directory")?;

        let app_state = AppState {
            engine: self.engine.clone(),
            upload_dir,
        };
        let auth_state = AuthState::new(self.config.api_keys.clone());

        let mut app = create_router(app_state, auth_state);

        if self.config.cors_enabled {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .allow_origin(Any);
            app = app.layer(cors);
        }

        app = app.layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(&addr)
            .await
            .context("Failed to bind HTTP server")?;

        info!("HTTP API server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("HTTP server shutting down");
            })
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}
