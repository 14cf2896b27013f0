//! Authentication service.
//!
//! Orchestrates registration, login, email verification, and password
//! recovery over the identity and ephemeral-token repositories. Role
//! resolution policy lives in [`resolver`]; bearer-token mechanics live in
//! [`crate::services::tokens`].

mod error;
pub mod password;
pub mod resolver;

pub use error::AuthError;
pub use resolver::{ResolvedIdentity, RoleInfo};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::SqlitePool;

use copperlast_core::Email;

use crate::db::RepositoryError;
use crate::db::admin_users::AdminUserRepository;
use crate::db::tokens::{EphemeralToken, EphemeralTokenRepository};
use crate::db::users::UserRepository;
use crate::models::user::User;

/// Email verification tokens live for 24 hours.
pub const VERIFICATION_TOKEN_TTL: Duration = Duration::hours(24);

/// Password reset tokens live for 1 hour.
pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    admins: AdminUserRepository<'a>,
    tokens: EphemeralTokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
            admins: AdminUserRepository::new(pool),
            tokens: EphemeralTokenRepository::new(pool),
        }
    }

    // =========================================================================
    // Registration & verification
    // =========================================================================

    /// Register a new customer account (unverified) and issue a verification
    /// token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword`, or
    /// `AuthError::AlreadyExists`.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        password::validate_password(password)?;

        let password_hash = password::hash_password(password, None).await?;

        let user = self
            .users
            .create(&email, Some(&password_hash), first_name, last_name, false)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = generate_token();
        self.tokens
            .insert_verification(user.id, &token, VERIFICATION_TOKEN_TTL)
            .await?;

        Ok((user, token))
    }

    /// Consume a verification token and mark the owning account verified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenNotFound`, `AuthError::TokenExpired`, or
    /// `AuthError::TokenUsed`. Under concurrent consumption exactly one
    /// caller succeeds; the loser sees `TokenUsed`.
    pub async fn verify_email(&self, token: &str) -> Result<User, AuthError> {
        let row = self
            .tokens
            .get_verification(token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        check_token_validity(&row)?;

        // Single conditional update; zero affected rows means another
        // consumer got here first.
        if !self.tokens.mark_verification_used(token).await? {
            return Err(AuthError::TokenUsed);
        }

        let user_id = copperlast_core::UserId::new(row.user_id);
        self.users.mark_email_verified(user_id).await?;

        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Re-issue a verification token for an unverified account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` for an unknown email and
    /// `AuthError::AlreadyVerified` when there is nothing to verify.
    pub async fn resend_verification(&self, email: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.email_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let token = generate_token();
        self.tokens
            .insert_verification(user.id, &token, VERIFICATION_TOKEN_TTL)
            .await?;

        Ok((user, token))
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Authenticate an email/password pair against both identity tables.
    ///
    /// # Errors
    ///
    /// See [`resolver::resolve_for_login`].
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ResolvedIdentity, AuthError> {
        let email = Email::parse(email)?;
        resolver::resolve_for_login(&self.users, &self.admins, &email, password).await
    }

    /// Resolve the role and permission set for an email.
    ///
    /// # Errors
    ///
    /// See [`resolver::resolve_role_for_email`].
    pub async fn role_for_email(&self, email: &str) -> Result<RoleInfo, AuthError> {
        let email = Email::parse(email)?;
        resolver::resolve_role_for_email(&self.users, &self.admins, &email).await
    }

    /// Look up a customer account by email (session bridge target).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no customer row exists.
    pub async fn user_by_email(&self, email: &Email) -> Result<User, AuthError> {
        self.users
            .get_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    // =========================================================================
    // Password recovery
    // =========================================================================

    /// Issue a password reset token if an active account exists.
    ///
    /// Returns `None` for unknown or inactive emails so the endpoint can
    /// answer identically either way (no account enumeration).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };

        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };
        if !user.is_active {
            return Ok(None);
        }

        let token = generate_token();
        self.tokens
            .insert_reset(user.id, user.email.as_str(), &token, RESET_TOKEN_TTL)
            .await?;

        Ok(Some((user, token)))
    }

    /// Validate a reset token without consuming it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenNotFound`, `AuthError::TokenExpired`, or
    /// `AuthError::TokenUsed`.
    pub async fn check_reset_token(&self, token: &str) -> Result<(), AuthError> {
        let row = self
            .tokens
            .get_reset(token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        check_token_validity(&row)
    }

    /// Consume a reset token and replace the owning account's credential.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` or a token validity error; the
    /// credential is left unchanged on any failure.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        password::validate_password(new_password)?;

        let row = self
            .tokens
            .get_reset(token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        check_token_validity(&row)?;

        if !self.tokens.mark_reset_used(token).await? {
            return Err(AuthError::TokenUsed);
        }

        let password_hash = password::hash_password(new_password, None).await?;
        self.users
            .set_password(copperlast_core::UserId::new(row.user_id), &password_hash)
            .await?;

        Ok(())
    }

    /// Look up an account for the recovery-notice flow.
    ///
    /// Returns `None` for unknown emails so the endpoint can answer
    /// identically either way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn find_for_recovery(&self, email: &str) -> Result<Option<User>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };
        Ok(self.users.get_by_email(&email).await?)
    }
}

/// Shared validity rule for ephemeral tokens.
fn check_token_validity(row: &EphemeralToken) -> Result<(), AuthError> {
    if row.used_at.is_some() {
        return Err(AuthError::TokenUsed);
    }
    if Utc::now() >= row.expires_at {
        return Err(AuthError::TokenExpired);
    }
    Ok(())
}

/// Generate a single-use token with 256 bits of entropy, base64url-encoded.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_entropy() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        // 32 bytes -> 43 base64url chars, no padding
        assert_eq!(a.len(), 43);
        assert!(!a.contains('='));
    }

    #[test]
    fn test_token_validity_rules() {
        let fresh = EphemeralToken {
            user_id: 1,
            email: None,
            token: "t".to_owned(),
            expires_at: Utc::now() + Duration::hours(1),
            used_at: None,
        };
        assert!(check_token_validity(&fresh).is_ok());

        let expired = EphemeralToken {
            expires_at: Utc::now() - Duration::seconds(1),
            ..fresh.clone()
        };
        assert!(matches!(
            check_token_validity(&expired),
            Err(AuthError::TokenExpired)
        ));

        let used = EphemeralToken {
            used_at: Some(Utc::now()),
            ..fresh
        };
        assert!(matches!(
            check_token_validity(&used),
            Err(AuthError::TokenUsed)
        ));
    }
}
