//! Back-office routes.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::middleware::auth::{RequireAdmin, RequireStaff};
use crate::services::auth::AuthService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check-status", post(check_status))
        .route("/users", get(list_users))
        .route("/dashboard", get(dashboard))
}

#[derive(Debug, Deserialize)]
struct CheckStatusRequest {
    email: String,
}

/// `POST /admin/check-status`
///
/// Resolves the role and permission set for an email, `admin_users` first.
/// 404 for emails with no back-office standing.
///
/// This endpoint is intentionally unauthenticated; the POS terminals call
/// it before any operator has logged in.
async fn check_status(
    State(state): State<AppState>,
    Json(payload): Json<CheckStatusRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let auth = AuthService::new(state.pool());
    let info = auth.role_for_email(&payload.email).await?;

    Ok(Json(json!({
        "role": info.role,
        "permissions": info.permissions,
    })))
}

/// `GET /admin/users`
///
/// Lists back-office accounts. Admin role required.
async fn list_users(
    RequireAdmin(_principal): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let admins = crate::db::admin_users::AdminUserRepository::new(state.pool());
    let users = admins.list_all().await?;

    let users: Vec<serde_json::Value> = users
        .iter()
        .map(|a| {
            json!({
                "id": a.id,
                "email": a.email,
                "role": a.role,
                "permissions": a.permissions,
                "is_active": a.is_active,
                "created_at": a.created_at,
            })
        })
        .collect();

    Ok(Json(json!({ "users": users })))
}

/// `GET /admin/dashboard`
///
/// Back-office landing data. Staff-level role required.
async fn dashboard(
    RequireStaff(principal): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let users = crate::db::users::UserRepository::new(state.pool());
    let customer_count = users.count().await?;

    Ok(Json(json!({
        "operator": {
            "email": principal.email,
            "role": principal.role,
        },
        "customer_count": customer_count,
    })))
}
