//! HTTP API route definitions

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::auth::{auth_middleware, AuthState};
use super::handlers::{self, AppState};

/// Create the API router with all routes
pub fn create_router(app_state: AppState, auth_state: AuthState) -> Router {
    let protected = Router::new()
        .route("/collections", post(handlers::create_collection))
        .route("/collections/:name/entries", post(handlers::insert_entry))
        .route("/collections/:name/query", post(handlers::query))
        .route("/collections/:name/text", post(handlers::add_text))
        .route("/collections/:name/text/query", post(handlers::query_text))
        .route("/collections/:name/images", post(handlers::add_image))
        .route(
            "/collections/:name/images/query",
            post(handlers::query_image),
        )
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(app_state);

    // Health stays outside the auth layer
    let api_v1 = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected);

    Router::new().nest("/api/v1", api_v1)
}
