//! HTTP API routes.
//!
//! Read-only endpoints over the crawler and the prewarmed overview cache.
//! Every `/api` route is gated by the shared-secret header check.
//!
//! # Routes
//!
//! - `GET /` - unauthenticated welcome message
//! - `GET /api/search/clubs?query=` - club search
//! - `GET /api/club/{club_id}` - full club overview
//! - `GET /api/club/{club_id}/teams` - teams of a club
//! - `GET /api/club/{club_id}/info` - teams plus club-level game lists
//! - `GET /api/club/{club_id}/next_games` - upcoming club games
//! - `GET /api/club/{club_id}/prev_games` - past club games
//! - `GET /api/team/{team_id}` - table plus team game lists
//! - `GET /api/team/{team_id}/table` - league table
//! - `GET /api/team/{team_id}/next_games` - upcoming team games
//! - `GET /api/team/{team_id}/prev_games` - past team games
//! - `GET /api/game/{game_id}` - single game with match events

pub mod club;
pub mod game;
pub mod search;
pub mod team;

use axum::routing::get;
use axum::{Json, Router, middleware};
use serde_json::json;

use crate::auth;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/search/clubs", get(search::search_for_clubs))
        .route("/club/{club_id}", get(club::full_club_info))
        .route("/club/{club_id}/teams", get(club::club_teams))
        .route("/club/{club_id}/info", get(club::club_info))
        .route("/club/{club_id}/next_games", get(club::club_next_games))
        .route("/club/{club_id}/prev_games", get(club::club_prev_games))
        .route("/team/{team_id}", get(team::team_info))
        .route("/team/{team_id}/table", get(team::team_table))
        .route("/team/{team_id}/next_games", get(team::team_next_games))
        .route("/team/{team_id}/prev_games", get(team::team_prev_games))
        .route("/game/{game_id}", get(game::game_by_id))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_api_key));

    Router::new().route("/", get(root)).nest("/api", api).with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    tracing::debug!("root endpoint requested");
    Json(json!({ "message": "Welcome to the spielplan API." }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testutil::offline_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use spielplan_core::AppConfig;
    use tower::ServiceExt;

    fn test_router(dir: &std::path::Path) -> Router {
        let config = AppConfig { api_key: "sekrit".into(), ..AppConfig::default() };
        router(offline_state(dir, config))
    }

    #[tokio::test]
    async fn test_root_is_unauthenticated() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_router(dir.path())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_key() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_router(dir.path())
            .oneshot(Request::builder().uri("/api/club/x/teams").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_api_rejects_wrong_key() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_router(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/api/club/x/teams")
                    .header("X-API-Key", "wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_api_accepts_key() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_router(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/api/club/x/teams")
                    .header("X-API-Key", "sekrit")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        // the offline crawler finds nothing, but the request is authorized
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_search_query_too_short() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_router(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/api/search/clubs?query=ab")
                    .header("X-API-Key", "sekrit")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_router(dir.path())
            .oneshot(
                Request::builder()
                    .uri("/api/game/nope")
                    .header("X-API-Key", "sekrit")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
