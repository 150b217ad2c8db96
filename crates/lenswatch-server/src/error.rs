//! Error rendering for the HTTP adapter

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lenswatch_core::ValidationError;
use lenswatch_poller::PollError;
use lenswatch_store::FetchError;

/// Anything that ends a request early. Rendered as a plain-text body.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Error fetching updates {0}")]
    Poll(#[from] PollError),

    #[error("Error fetching lenses {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            ApiError::Poll(PollError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Poll(_) | ApiError::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
