//! Shared-secret authentication for the API routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

/// Header clients must present on every /api request.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware rejecting requests whose X-API-Key header does not match the
/// configured shared secret.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request.headers().get(API_KEY_HEADER).and_then(|value| value.to_str().ok());
    if provided != Some(state.config.api_key.as_str()) {
        return ApiError::Unauthorized.into_response();
    }
    next.run(request).await
}
