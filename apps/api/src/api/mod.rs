pub mod connections;
pub mod jobs;
pub mod workflows;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/workflows", post(workflows::start_workflow))
        .route("/api/jobs/{id}/pause", post(jobs::pause_job))
        .route("/api/jobs/{id}/cancel", post(jobs::cancel_job))
        .route("/api/jobs/{id}/stream", get(jobs::stream_status))
        .route(
            "/api/accounts/{id}/check-connections",
            post(connections::check_connections),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
