//! Team endpoints.

use axum::Json;
use axum::extract::{Path, State};

use crate::error::ApiError;
use crate::state::AppState;
use spielplan_core::model::{Game, Table, TeamInfo};

/// Combined team info: league table plus next and previous games.
pub async fn team_info(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Json<TeamInfo> {
    if let Some(team) = state.find_team(&team_id).await {
        tracing::debug!("serving team info for {} from overview cache", team_id);
        return Json(TeamInfo {
            table: team.table,
            prev_games: team.prev_games,
            next_games: team.next_games,
        });
    }

    let crawler = &state.crawler;
    let (table, next_games, prev_games) = tokio::join!(
        crawler.team_table(&team_id),
        crawler.team_next_games(&team_id),
        crawler.team_prev_games(&team_id),
    );
    Json(TeamInfo { table, prev_games, next_games })
}

/// The league table for a team.
pub async fn team_table(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<Table>, ApiError> {
    if let Some(team) = state.find_team(&team_id).await
        && let Some(table) = team.table
    {
        tracing::debug!("serving table for team {} from overview cache", team_id);
        return Ok(Json(table));
    }

    match state.crawler.team_table(&team_id).await {
        Some(table) => Ok(Json(table)),
        None => Err(ApiError::NotFound("Table not found for this team.".into())),
    }
}

/// Upcoming games for a team.
pub async fn team_next_games(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Json<Vec<Game>> {
    if let Some(team) = state.find_team(&team_id).await {
        tracing::debug!("serving next games for team {} from overview cache", team_id);
        return Json(team.next_games);
    }
    Json(state.crawler.team_next_games(&team_id).await)
}

/// Past games for a team.
pub async fn team_prev_games(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Json<Vec<Game>> {
    if let Some(team) = state.find_team(&team_id).await {
        tracing::debug!("serving previous games for team {} from overview cache", team_id);
        return Json(team.prev_games);
    }
    Json(state.crawler.team_prev_games(&team_id).await)
}
