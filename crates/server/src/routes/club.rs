//! Club endpoints.

use axum::Json;
use axum::extract::{Path, State};

use crate::state::AppState;
use spielplan_core::model::{ClubInfo, ClubOverview, Game, Team};

/// All available information for a club in a single response: club-level
/// game lists plus every team with table and games.
///
/// Served from the prewarmed overview when available, otherwise assembled
/// on demand.
pub async fn full_club_info(
    State(state): State<AppState>,
    Path(club_id): Path<String>,
) -> Json<ClubOverview> {
    if let Some(cached) = state.overview(&club_id).await {
        tracing::debug!("serving full club info for {} from overview cache", club_id);
        return Json(cached);
    }
    Json(state.crawler.club_overview(&club_id).await)
}

/// All teams of a club.
pub async fn club_teams(
    State(state): State<AppState>,
    Path(club_id): Path<String>,
) -> Json<Vec<Team>> {
    if let Some(cached) = state.overview(&club_id).await {
        tracing::debug!("serving teams for club {} from overview cache", club_id);
        return Json(cached.teams.iter().map(|team| team.team()).collect());
    }
    Json(state.crawler.club_teams(&club_id).await)
}

/// Combined club info: teams plus club-level next and previous games.
pub async fn club_info(
    State(state): State<AppState>,
    Path(club_id): Path<String>,
) -> Json<ClubInfo> {
    if let Some(cached) = state.overview(&club_id).await {
        tracing::debug!("serving club info for {} from overview cache", club_id);
        return Json(ClubInfo {
            teams: cached.teams.iter().map(|team| team.team()).collect(),
            next_games: cached.club_next_games,
            prev_games: cached.club_prev_games,
        });
    }

    let crawler = &state.crawler;
    let (teams, next_games, prev_games) = tokio::join!(
        crawler.club_teams(&club_id),
        crawler.club_next_games(&club_id),
        crawler.club_prev_games(&club_id),
    );
    Json(ClubInfo { teams, prev_games, next_games })
}

/// Upcoming games for all teams of a club.
pub async fn club_next_games(
    State(state): State<AppState>,
    Path(club_id): Path<String>,
) -> Json<Vec<Game>> {
    if let Some(cached) = state.overview(&club_id).await {
        tracing::debug!("serving next games for club {} from overview cache", club_id);
        return Json(cached.club_next_games);
    }
    Json(state.crawler.club_next_games(&club_id).await)
}

/// Past games for all teams of a club.
pub async fn club_prev_games(
    State(state): State<AppState>,
    Path(club_id): Path<String>,
) -> Json<Vec<Game>> {
    if let Some(cached) = state.overview(&club_id).await {
        tracing::debug!("serving previous games for club {} from overview cache", club_id);
        return Json(cached.club_prev_games);
    }
    Json(state.crawler.club_prev_games(&club_id).await)
}
