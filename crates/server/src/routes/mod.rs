//! HTTP route definitions.

pub mod admin;
pub mod auth;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

/// Build the application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
}

/// Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness probe; verifies database connectivity.
async fn readiness(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, crate::error::AppError> {
    sqlx::query("SELECT 1")
        .execute(state.pool())
        .await
        .map_err(crate::db::RepositoryError::from)?;
    Ok(Json(json!({ "status": "ready" })))
}
