//! Search handler
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::info;

use super::ApiError;
use super::AppState;
use crate::api::types::SearchRequest;
use crate::api::types::SearchResponse;
use crate::api::types::SearchResultResponse;

/// Ranked chunks for a query (POST /api/search)
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(req) = payload?;
    info!("POST /api/search: {:?}", req.query);

    let options = req.options()?;
    let mut outcome = state.service.search(&req.query, options).await?;

    let results = std::mem::take(&mut outcome.results)
        .into_iter()
        .map(|result| {
            let url = state.service.source_url(&result.document);
            SearchResultResponse::new(result, url)
        })
        .collect();

    Ok(Json(SearchResponse::new(outcome, results)))
}
