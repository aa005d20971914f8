//! Club search endpoint.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;
use spielplan_core::model::ClubSearchResult;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
}

/// Search clubs by name. The query must be at least 3 characters long.
pub async fn search_for_clubs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ClubSearchResult>>, ApiError> {
    if params.query.chars().count() < 3 {
        return Err(ApiError::Validation("query must be at least 3 characters long".into()));
    }
    Ok(Json(state.crawler.search_clubs(&params.query).await))
}
