//! Authentication error types.

use thiserror::Error;

use copperlast_core::EmailError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email format is invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password doesn't meet requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Email is already registered.
    #[error("account already exists")]
    AlreadyExists,

    /// Wrong password or unknown account. The two cases are deliberately
    /// indistinguishable to the client.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Credentials are valid but the email has not been verified. Disclosed
    /// to the client so it can offer a resend-verification action.
    #[error("email not verified")]
    EmailNotVerified,

    /// The email is already verified; nothing to resend.
    #[error("email already verified")]
    AlreadyVerified,

    /// No account for the given identity.
    #[error("user not found")]
    UserNotFound,

    /// Ephemeral token value is unknown.
    #[error("token not found")]
    TokenNotFound,

    /// Ephemeral token is past its expiration.
    #[error("token expired")]
    TokenExpired,

    /// Ephemeral token was already consumed.
    #[error("token already used")]
    TokenUsed,

    /// No active session for a session-bound operation.
    #[error("no active session")]
    NoSession,

    /// Password hashing failed.
    #[error("password hashing failed")]
    Hash,

    /// Database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
