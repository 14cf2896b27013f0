//! Ephemeral token repository for email verification and password reset.
//!
//! Both token kinds share the same shape and rules: high-entropy single-use
//! values with a fixed expiry. Issuing deletes any prior unused rows for the
//! same user inside one transaction, so at most one unused token is live per
//! user and purpose. Consumption is a single conditional update; a
//! read-then-write sequence would let two concurrent consumers both succeed.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

use copperlast_core::UserId;

use super::RepositoryError;

/// A stored ephemeral token row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EphemeralToken {
    pub user_id: i64,
    pub email: Option<String>,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// Repository for single-use expiring tokens.
pub struct EphemeralTokenRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EphemeralTokenRepository<'a> {
    /// Create a new ephemeral token repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new email verification token, replacing any unused one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn insert_verification(
        &self,
        user_id: UserId,
        token: &str,
        ttl: Duration,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM email_verification_tokens WHERE user_id = ? AND used_at IS NULL",
        )
        .bind(user_id.as_i64())
        .execute(&mut *tx)
        .await?;

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO email_verification_tokens \
                 (user_id, token, expires_at, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id.as_i64())
        .bind(token)
        .bind(now + ttl)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Insert a new password reset token, replacing any unused one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn insert_reset(
        &self,
        user_id: UserId,
        email: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = ? AND used_at IS NULL")
            .bind(user_id.as_i64())
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        sqlx::query(
            "INSERT INTO password_reset_tokens \
                 (user_id, email, token, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id.as_i64())
        .bind(email)
        .bind(token)
        .bind(now + ttl)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Look up a verification token by value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_verification(
        &self,
        token: &str,
    ) -> Result<Option<EphemeralToken>, RepositoryError> {
        let row = sqlx::query_as::<_, EphemeralToken>(
            "SELECT user_id, NULL AS email, token, expires_at, used_at \
             FROM email_verification_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Look up a reset token by value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_reset(
        &self,
        token: &str,
    ) -> Result<Option<EphemeralToken>, RepositoryError> {
        let row = sqlx::query_as::<_, EphemeralToken>(
            "SELECT user_id, email, token, expires_at, used_at \
             FROM password_reset_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Atomically mark a verification token as used.
    ///
    /// Returns `false` when the token was already consumed (zero rows
    /// affected), which is how a lost consumption race surfaces.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_verification_used(&self, token: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE email_verification_tokens SET used_at = ? \
             WHERE token = ? AND used_at IS NULL",
        )
        .bind(Utc::now())
        .bind(token)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomically mark a reset token as used.
    ///
    /// Returns `false` when the token was already consumed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_reset_used(&self, token: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = ? \
             WHERE token = ? AND used_at IS NULL",
        )
        .bind(Utc::now())
        .bind(token)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
