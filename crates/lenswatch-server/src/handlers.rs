//! REST API handlers for the Lenswatch server

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, Uri},
    response::{IntoResponse, Json, Response},
};
use lenswatch_core::{DiffResult, LensSummary, UpdateRequest, lens_prefix_from_json};
use serde::Serialize;

use crate::{ApiError, ServerState};

/// Response structure for the lens listing API
#[derive(Debug, Serialize)]
pub struct LensesResponse {
    pub lenses: Vec<LensSummary>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
}

/// Wait for the lens scope to change relative to the caller's snapshot.
///
/// Returns as soon as a change is seen, or with an empty diff once the poll
/// deadline passes.
pub async fn update(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<Json<DiffResult>, ApiError> {
    let request = UpdateRequest::from_json(&body)?;
    tracing::info!(
        "Update requested for lens {} ({} known nodes)",
        request.lens,
        request.snapshot.len()
    );

    let mut cancel = state.shutdown_signal();
    let outcome = state
        .poller
        .poll_with(state.connector.as_ref(), &request, &mut cancel)
        .await?;

    Ok(Json(outcome.into_diff()))
}

/// List lenses, optionally narrowed by a full-text prefix.
pub async fn get_lenses(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<Json<LensesResponse>, ApiError> {
    let prefix = lens_prefix_from_json(&body)?;
    let session = state.connector.connect().await?;
    let lenses = session.list_lenses(&prefix).await?;
    tracing::debug!("Listed {} lens(es) for prefix {:?}", lenses.len(), prefix);
    Ok(Json(LensesResponse { lenses }))
}

/// Answer CORS preflight requests with an empty object.
pub async fn preflight() -> impl IntoResponse {
    Json(serde_json::json!({}))
}

/// Any unrouted path: preflight still succeeds, everything else is rejected.
pub async fn invalid_path(method: Method, uri: Uri) -> Response {
    if method == Method::OPTIONS {
        return preflight().await.into_response();
    }
    ApiError::InvalidPath(uri.path().to_string()).into_response()
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: state.connector.name().to_string(),
    };
    Json(health)
}
