//! Customer account domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use copperlast_core::{Email, Role, UserId};

/// A storefront customer account (domain type).
///
/// The password credential is intentionally not part of this type; it is
/// fetched separately by the login path and never leaves the service layer.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Optional first name.
    pub first_name: Option<String>,
    /// Optional last name.
    pub last_name: Option<String>,
    /// Whether the email has been verified.
    pub email_verified: bool,
    /// When the email was verified, if ever.
    pub email_verified_at: Option<DateTime<Utc>>,
    /// Legacy elevation flag; grants the `admin` role on login.
    pub is_admin: bool,
    /// Soft-disable flag; inactive accounts cannot log in.
    pub is_active: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Effective role for this account.
    #[must_use]
    pub const fn role(&self) -> Role {
        if self.is_admin { Role::Admin } else { Role::User }
    }
}

/// Client-facing view of a user.
///
/// Constructed from [`User`], which carries no credential field, so a
/// password hash cannot leak into a response by construction.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email_verified: bool,
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email_verified: user.email_verified,
            role: user.role(),
        }
    }
}
