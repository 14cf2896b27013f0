//! Back-office account domain types.

use chrono::{DateTime, Utc};

use copperlast_core::{AdminUserId, Email, Permissions, Role};

/// A back-office staff or admin account (domain type).
///
/// Created only by operator tooling (`cl-cli admin create`); there is no
/// public self-registration for this identity space. Accounts are soft
/// deleted via `deleted_at` for audit.
#[derive(Debug, Clone)]
pub struct AdminUser {
    /// Unique admin user ID.
    pub id: AdminUserId,
    /// Account email address.
    pub email: Email,
    /// Stored role (`staff` or `admin`).
    pub role: Role,
    /// Per-capability overrides layered on top of the role.
    pub permissions: Permissions,
    /// Soft-disable flag; inactive accounts cannot log in.
    pub is_active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp, if the account has been archived.
    pub deleted_at: Option<DateTime<Utc>>,
}
