//! Game endpoints.

use axum::Json;
use axum::extract::{Path, State};

use crate::error::ApiError;
use crate::state::AppState;
use spielplan_core::model::Game;

/// Details and match events for a single game.
///
/// The prewarmed overview is searched first (club-level lists, then
/// team-level); only an unlocatable game becomes a 404.
pub async fn game_by_id(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Game>, ApiError> {
    if let Some(game) = state.find_game(&game_id).await {
        tracing::debug!("serving game {} from overview cache", game_id);
        return Ok(Json(game));
    }

    match state.crawler.game_by_id(&game_id).await {
        Some(game) => Ok(Json(game)),
        None => Err(ApiError::NotFound(format!(
            "Game {game_id} not found or could not be parsed."
        ))),
    }
}
