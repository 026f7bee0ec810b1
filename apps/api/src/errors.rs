use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::publish::error::{ErrorKind, PublishError, RetryAdvice};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Publish(#[from] PublishError),
}

fn publish_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::RemoteRejected | ErrorKind::Transport => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": msg,
                    "kind": ErrorKind::Validation.code(),
                    "retry": RetryAdvice::Never,
                }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "Unauthorized",
                    "kind": ErrorKind::Unauthenticated.code(),
                    "retry": RetryAdvice::Never,
                }),
            ),
            AppError::Publish(e) => {
                let status = publish_status(e.kind());
                if status.is_server_error() {
                    tracing::error!("GitHub API error: {e}");
                }
                let mut body = json!({
                    "error": e.to_string(),
                    "kind": e.kind().code(),
                    "retry": e.retry(),
                });
                if let Some(stage) = e.stage() {
                    body["stage"] = json!(stage);
                }
                (status, body)
            }
        };

        (status, Json(body)).into_response()
    }
}
