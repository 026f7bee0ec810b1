//! Axum route handlers for the Publish API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};

use crate::errors::AppError;
use crate::publish::models::{PublishOutcome, PublishRequest};
use crate::publish::orchestrator::Publisher;
use crate::state::AppState;

/// Extracts the GitHub access token from `Authorization: Bearer <token>`.
/// Token acquisition and sessions live outside this service.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// POST /api/v1/portfolio/publish
///
/// First call against an existing repository only reports `exists: true`;
/// re-send with `force: true` to overwrite.
pub async fn handle_publish(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<Json<PublishOutcome>, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let session = state.github.authenticated(token);
    let outcome = Publisher::new(&session, &state.config.repo_description)
        .publish(request)
        .await?;

    Ok(Json(outcome))
}
