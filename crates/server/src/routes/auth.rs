//! Authentication routes.
//!
//! Registration, login, logout, email verification, password recovery, and
//! the session bridge. Recovery-style endpoints (`forgot-password`,
//! `forgot-email`) answer identically whether or not an account exists.

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::auth::{auth_cookie, clear_auth_cookie};
use crate::models::session::{CurrentUser, keys};
use crate::models::user::UserResponse;
use crate::services::auth::{AuthService, ResolvedIdentity};
use crate::services::tokens::LOGIN_TOKEN_TTL;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/verify-email", get(verify_email))
        .route("/resend-verification", post(resend_verification))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", get(check_reset_token).post(reset_password))
        .route("/forgot-email", post(forgot_email))
        .route("/session", get(session_info))
        .route("/session-to-jwt", post(session_to_jwt))
}

/// Canonical response for endpoints that must not reveal account existence.
const RECOVERY_MESSAGE: &str =
    "If an account exists for that email, a message has been sent to it.";

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct EmailRequest {
    email: String,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ResetPasswordRequest {
    token: String,
    password: String,
}

/// `POST /auth/register`
///
/// Creates an unverified account and emails a verification link. The
/// account cannot log in until the link is followed.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());
    let (user, token) = auth
        .register(
            &payload.email,
            &payload.password,
            payload.first_name.as_deref(),
            payload.last_name.as_deref(),
        )
        .await?;

    send_verification(&state, &user.email, &token).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "account created; check your email to verify your address",
            "user": UserResponse::from(&user),
        })),
    )
        .into_response())
}

/// `POST /auth/login`
///
/// Authenticates against both identity tables and returns a bearer token,
/// also installed as an `HttpOnly` cookie. A parallel server-side session
/// is established for the storefront.
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(state.pool());
    let identity = auth.login(&payload.email, &payload.password).await?;

    let token = state.tokens().issue(
        identity.subject_id(),
        identity.email(),
        identity.role(),
        LOGIN_TOKEN_TTL,
    )?;

    session
        .insert(
            keys::CURRENT_USER,
            &CurrentUser {
                id: identity.subject_id(),
                email: identity.email().clone(),
                role: identity.role(),
            },
        )
        .await?;

    let body = match &identity {
        ResolvedIdentity::Customer(user) => json!({
            "message": "login successful",
            "token": token,
            "user": UserResponse::from(user),
        }),
        ResolvedIdentity::BackOffice(admin) => json!({
            "message": "login successful",
            "token": token,
            "role": admin.role,
            "permissions": admin.permissions,
        }),
    };

    Ok((
        [(
            header::SET_COOKIE,
            auth_cookie(&token, state.config().is_https()),
        )],
        Json(body),
    )
        .into_response())
}

/// `POST /auth/logout`
///
/// Destroys the server-side session and clears the auth cookie. The bearer
/// token itself remains valid until expiry; clients must discard it.
async fn logout(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    session.flush().await?;

    Ok((
        [(
            header::SET_COOKIE,
            clear_auth_cookie(state.config().is_https()),
        )],
        Json(json!({ "message": "logged out" })),
    )
        .into_response())
}

/// `GET /auth/verify-email?token=...`
///
/// Consumes a verification token; exactly one caller can succeed per token.
async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let auth = AuthService::new(state.pool());
    let user = auth.verify_email(&query.token).await?;

    Ok(Json(json!({
        "message": "email verified",
        "user": UserResponse::from(&user),
    })))
}

/// `POST /auth/resend-verification`
///
/// Issues a fresh verification token for an unverified account. Unlike the
/// recovery endpoints this one does disclose existence: 404 for an unknown
/// email, 400 when already verified.
async fn resend_verification(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let auth = AuthService::new(state.pool());
    let (user, token) = auth.resend_verification(&payload.email).await?;

    send_verification(&state, &user.email, &token).await;

    Ok(Json(json!({ "message": "verification email sent" })))
}

/// `POST /auth/forgot-password`
///
/// Always answers 200 with the same message; a reset email is sent only if
/// an active account exists.
async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let auth = AuthService::new(state.pool());

    if let Some((user, token)) = auth.request_password_reset(&payload.email).await? {
        if let Some(email) = state.email() {
            if let Err(e) = email.send_password_reset(&user.email, &token).await {
                tracing::error!(recipient = %user.email, "failed to send reset email: {e}");
            }
        } else {
            tracing::debug!(recipient = %user.email, "email disabled; reset token: {token}");
        }
    }

    Ok(Json(json!({ "message": RECOVERY_MESSAGE })))
}

/// `GET /auth/reset-password?token=...`
///
/// Validates a reset token without consuming it, so the reset form can be
/// shown or skipped before the user types a new password.
async fn check_reset_token(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let auth = AuthService::new(state.pool());
    auth.check_reset_token(&query.token).await?;

    Ok(Json(json!({ "message": "token is valid" })))
}

/// `POST /auth/reset-password`
///
/// Consumes a reset token and replaces the account's password.
async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let auth = AuthService::new(state.pool());
    auth.reset_password(&payload.token, &payload.password).await?;

    Ok(Json(json!({ "message": "password updated; you can now log in" })))
}

/// `POST /auth/forgot-email`
///
/// Sends an account-details reminder if the address is registered. Always
/// answers 200 with the same message.
async fn forgot_email(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let auth = AuthService::new(state.pool());

    if let Some(user) = auth.find_for_recovery(&payload.email).await?
        && let Some(email) = state.email()
        && let Err(e) = email.send_account_recovery(&user.email).await
    {
        tracing::error!(recipient = %user.email, "failed to send recovery email: {e}");
    }

    Ok(Json(json!({ "message": RECOVERY_MESSAGE })))
}

/// `GET /auth/session`
///
/// The current session identity, or `null` if none.
async fn session_info(session: Session) -> Result<Json<Option<CurrentUser>>, AppError> {
    let current: Option<CurrentUser> = session.get(keys::CURRENT_USER).await?;
    Ok(Json(current))
}

/// `POST /auth/session-to-jwt`
///
/// Bridges a cookie session into a bearer token for API clients. The
/// session identity is re-resolved against the `users` table; back-office
/// accounts use `POST /auth/login` directly. The bridged role is `staff`
/// unless the account carries the legacy admin flag.
async fn session_to_jwt(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let current: CurrentUser = session
        .get(keys::CURRENT_USER)
        .await?
        .ok_or(AppError::Auth(crate::services::auth::AuthError::NoSession))?;

    let auth = AuthService::new(state.pool());
    let user = auth.user_by_email(&current.email).await?;

    let role = if user.is_admin {
        copperlast_core::Role::Admin
    } else {
        copperlast_core::Role::Staff
    };

    let token = state
        .tokens()
        .issue(user.id, &user.email, role, LOGIN_TOKEN_TTL)?;

    Ok((
        [(
            header::SET_COOKIE,
            auth_cookie(&token, state.config().is_https()),
        )],
        Json(json!({
            "token": token,
            "user": UserResponse::from(&user),
            "role": role,
        })),
    )
        .into_response())
}

/// Best-effort verification email; a delivery failure never fails the
/// calling request.
async fn send_verification(state: &AppState, to: &copperlast_core::Email, token: &str) {
    if let Some(email) = state.email() {
        if let Err(e) = email.send_verification_email(to, token).await {
            tracing::error!(recipient = %to, "failed to send verification email: {e}");
        }
    } else {
        tracing::debug!(recipient = %to, "email disabled; verification token: {token}");
    }
}
