//! Answer handler
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::info;

use super::ApiError;
use super::AppState;
use crate::api::types::AnswerRequest;
use crate::api::types::AnswerResponse;

/// Grounded answer with citations (POST /api/answer)
pub async fn answer(
    State(state): State<AppState>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let Json(req) = payload?;
    info!("POST /api/answer: {:?}", req.query);

    let options = req.options()?;
    let outcome = state.service.answer(&req.query, options).await?;

    Ok(Json(AnswerResponse::from(outcome)))
}
