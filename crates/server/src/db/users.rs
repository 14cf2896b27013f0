//! Customer account repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use copperlast_core::{Email, UserId};

use super::RepositoryError;
use crate::models::user::User;

/// Internal row type for `users` queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email_verified: bool,
    email_verified_at: Option<DateTime<Utc>>,
    is_admin: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            email_verified: row.email_verified,
            email_verified_at: row.email_verified_at,
            is_admin: row.is_admin,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_USER: &str = "SELECT id, email, password_hash, first_name, last_name, \
     email_verified, email_verified_at, is_admin, is_active, created_at, updated_at \
     FROM users";

/// Repository for customer account database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE email = ?"))
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = ?"))
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user together with their stored password hash, if any.
    ///
    /// The hash is `None` for external-provider accounts that have never set
    /// a local password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_credential(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE email = ?"))
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(r) => {
                let hash = r.password_hash.clone();
                Ok(Some((r.try_into()?, hash)))
            }
            None => Ok(None),
        }
    }

    /// Create a new user.
    ///
    /// A `None` password hash creates an external-provider account which can
    /// never authenticate via password login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email_verified: bool,
    ) -> Result<User, RepositoryError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users \
                 (email, password_hash, first_name, last_name, email_verified, \
                  email_verified_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, email, password_hash, first_name, last_name, \
                 email_verified, email_verified_at, is_admin, is_active, \
                 created_at, updated_at",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(email_verified)
        .bind(email_verified.then_some(now))
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Total number of customer accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Replace a user's password credential.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_password(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(user_id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Mark a user's email as verified.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn mark_email_verified(&self, user_id: UserId) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE users SET email_verified = 1, email_verified_at = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(now)
        .bind(now)
        .bind(user_id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
