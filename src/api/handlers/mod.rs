//! API request handlers

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use tracing::error;
use tracing::warn;

use crate::api::types::ErrorResponse;
use crate::api::types::HealthResponse;
use crate::errors::KbRagError;
use crate::rag::KnowledgeService;

pub mod answer;
pub mod search;

pub use answer::*;
pub use search::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<KnowledgeService>,
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Error returned by handlers.
///
/// Client errors echo their message with 400; everything else is logged
/// and reported as a generic 500.
#[derive(Debug)]
pub struct ApiError(KbRagError);

impl From<KbRagError> for ApiError {
    fn from(err: KbRagError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(KbRagError::InvalidRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = if self.0.is_client_error() {
            warn!("Rejected request: {}", self.0);
            (StatusCode::BAD_REQUEST, self.0.to_string())
        } else {
            error!("Request failed: {}", self.0);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process request".to_string(),
            )
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
