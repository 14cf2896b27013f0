//! Back-office account repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use copperlast_core::{AdminUserId, Email, Permissions, Role};

use super::RepositoryError;
use crate::models::admin_user::AdminUser;

/// Internal row type for `admin_users` queries.
#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: i64,
    email: String,
    password_hash: Option<String>,
    password: Option<String>,
    role: String,
    permissions: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let role: Role = row.role.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: AdminUserId::new(row.id),
            email,
            role,
            // Corrupted permission text degrades to an empty set, never an error.
            permissions: Permissions::parse_lenient(row.permissions.as_deref()),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

const SELECT_ADMIN: &str = "SELECT id, email, password_hash, password, role, permissions, \
     is_active, created_at, updated_at, deleted_at \
     FROM admin_users";

/// Repository for back-office account database operations.
pub struct AdminUserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an active, non-deleted account by email, together with its
    /// credential hashes.
    ///
    /// Returns both credential columns: `password_hash` and the legacy
    /// `password` column carried over from the old POS database. The login
    /// path verifies against whichever is populated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn get_active_with_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, Option<String>, Option<String>)>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "{SELECT_ADMIN} WHERE email = ? AND is_active = 1 AND deleted_at IS NULL"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => {
                let primary = r.password_hash.clone();
                let legacy = r.password.clone();
                Ok(Some((r.try_into()?, primary, legacy)))
            }
            None => Ok(None),
        }
    }

    /// Get a non-deleted account by email regardless of the active flag.
    ///
    /// Used by the role/status lookup, which reports archived-but-not-deleted
    /// accounts the same way the legacy system did.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn get_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "{SELECT_ADMIN} WHERE email = ? AND deleted_at IS NULL"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List all non-deleted accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if any stored data is invalid.
    pub async fn list_all(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminUserRow>(&format!(
            "{SELECT_ADMIN} WHERE deleted_at IS NULL ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Create a new back-office account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        role: Role,
        permissions: &Permissions,
    ) -> Result<AdminUser, RepositoryError> {
        let stored_permissions = permissions.to_stored().map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize permissions: {e}"))
        })?;

        let now = Utc::now();
        let row = sqlx::query_as::<_, AdminUserRow>(
            "INSERT INTO admin_users \
                 (email, password_hash, role, permissions, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING id, email, password_hash, password, role, permissions, \
                 is_active, created_at, updated_at, deleted_at",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .bind(role.to_string())
        .bind(stored_permissions)
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

    /// Rotate an account's password credential.
    ///
    /// Clears the legacy `password` column so the account is fully migrated
    /// to the current credential format after rotation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_password(
        &self,
        id: AdminUserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE admin_users \
             SET password_hash = ?, password = NULL, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Soft-delete an account, keeping the row for audit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist or
    /// was already deleted.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn soft_delete(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE admin_users SET deleted_at = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
