//! Axum router setup for the Lenswatch server

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, header},
    routing::{get, post},
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::{
    ServerState,
    handlers::{get_lenses, health_check, invalid_path, preflight, update},
};

/// Create the axum router with all routes
///
/// The diff and listing operations are also reachable under one leading
/// path segment, so the server can sit behind a gateway stage prefix.
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Lens diff and discovery
        .route("/update", post(update).options(preflight))
        .route("/getLenses", post(get_lenses).options(preflight))
        .route("/:stage/update", post(update).options(preflight))
        .route("/:stage/getLenses", post(get_lenses).options(preflight))
        .route("/api/health", get(health_check))
        .fallback(invalid_path)
        // CORS headers are fixed on every reply; preflight is answered by
        // the handlers so it gets the same `{}` body as any other OPTIONS
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET,POST,OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
        // Add state
        .with_state(state)
}
