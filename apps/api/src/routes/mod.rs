pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::publish::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/portfolio/publish",
            post(handlers::handle_publish),
        )
        .with_state(state)
}
