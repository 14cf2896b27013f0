//! Application error handling.
//!
//! Every handler returns `Result<_, AppError>`; the `IntoResponse` impl is
//! the single place where internal errors are collapsed into the HTTP error
//! taxonomy. Internal detail (SQL errors, hashing failures) is logged
//! server-side and never leaks into a response body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::tokens::TokenError;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing request input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Authentication required and not provided or not valid.
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated but lacking the required role.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found")]
    NotFound,

    /// Authentication flow error.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Bearer token error.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Database error.
    #[error(transparent)]
    Database(#[from] RepositoryError),

    /// Session store error.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AppError {
    /// The HTTP status and client-visible message for this error.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_owned()),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_owned()),
            Self::NotFound => (StatusCode::NOT_FOUND, "not found".to_owned()),
            Self::Auth(auth) => auth_status_and_message(auth),
            // All token failures present as one generic 401.
            Self::Token(_) => (StatusCode::UNAUTHORIZED, "unauthorized".to_owned()),
            Self::Session(e) => {
                tracing::error!("session error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
            Self::Database(e) => {
                tracing::error!("database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        }
    }
}

fn auth_status_and_message(error: &AuthError) -> (StatusCode, String) {
    match error {
        AuthError::InvalidEmail(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AuthError::AlreadyExists => (
            StatusCode::CONFLICT,
            "an account with this email already exists".to_owned(),
        ),
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "invalid email or password".to_owned(),
        ),
        AuthError::EmailNotVerified => (
            StatusCode::FORBIDDEN,
            "please verify your email address before logging in".to_owned(),
        ),
        AuthError::AlreadyVerified => {
            (StatusCode::BAD_REQUEST, "email is already verified".to_owned())
        }
        AuthError::UserNotFound => (StatusCode::NOT_FOUND, "account not found".to_owned()),
        AuthError::TokenNotFound | AuthError::TokenExpired | AuthError::TokenUsed => (
            StatusCode::BAD_REQUEST,
            "this link is invalid or has expired".to_owned(),
        ),
        AuthError::NoSession => (StatusCode::UNAUTHORIZED, "no active session".to_owned()),
        AuthError::Hash | AuthError::Repository(_) => {
            tracing::error!("auth internal error: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_owned(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: AppError) -> StatusCode {
        error.status_and_message().0
    }

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(
            status_of(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AuthError::EmailNotVerified.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AuthError::AlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AuthError::UserNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(AuthError::NoSession.into()), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_ephemeral_token_errors_are_uniform() {
        for error in [
            AuthError::TokenNotFound,
            AuthError::TokenExpired,
            AuthError::TokenUsed,
        ] {
            let (status, message) = AppError::from(error).status_and_message();
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "this link is invalid or has expired");
        }
    }

    #[test]
    fn test_internal_errors_do_not_leak_detail() {
        let error = AppError::Database(RepositoryError::DataCorruption(
            "secret detail".to_owned(),
        ));
        let (status, message) = error.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("secret detail"));
    }

    #[test]
    fn test_bearer_token_errors_are_uniform() {
        for error in [TokenError::Missing, TokenError::Expired, TokenError::Invalid] {
            assert_eq!(status_of(error.into()), StatusCode::UNAUTHORIZED);
        }
    }
}
