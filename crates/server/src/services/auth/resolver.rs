//! Identity resolution policy.
//!
//! Every code path that needs to answer "who is this email?" goes through
//! this module, so the precedence rules live in exactly one place.
//!
//! Two policies exist, with *different* lookup orders, matching the
//! production system this service replaced:
//!
//! - **Login** checks `users` first, then active `admin_users`. When the
//!   same email exists in both tables the customer row always wins and the
//!   back-office role and permissions are silently ignored. This is a known
//!   hazard of the dual-table identity model and is preserved deliberately;
//!   the duplicate-email case is pinned by an integration test.
//! - **Role lookup** (the back-office status check) goes the other way:
//!   `admin_users` first, then customers carrying the legacy admin flag,
//!   which synthesize an `admin` role with every capability granted.

use copperlast_core::{Email, Permissions, Role, UserId};

use super::error::AuthError;
use super::password::verify_password;
use crate::db::admin_users::AdminUserRepository;
use crate::db::users::UserRepository;
use crate::models::admin_user::AdminUser;
use crate::models::user::User;

/// Capabilities granted wholesale to legacy admin-flagged customers.
pub const ALL_CAPABILITIES: &[&str] = &[
    "orders",
    "pos",
    "products",
    "customers",
    "reports",
    "settings",
];

/// An authenticated identity from either table.
#[derive(Debug, Clone)]
pub enum ResolvedIdentity {
    /// Matched in the `users` table.
    Customer(User),
    /// Matched in the `admin_users` table.
    BackOffice(AdminUser),
}

impl ResolvedIdentity {
    /// Numeric subject ID within the matched identity space.
    #[must_use]
    pub const fn subject_id(&self) -> UserId {
        match self {
            Self::Customer(user) => user.id,
            Self::BackOffice(admin) => UserId::new(admin.id.as_i64()),
        }
    }

    /// The resolved email.
    #[must_use]
    pub const fn email(&self) -> &Email {
        match self {
            Self::Customer(user) => &user.email,
            Self::BackOffice(admin) => &admin.email,
        }
    }

    /// Effective role for token claims.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Customer(user) => user.role(),
            Self::BackOffice(admin) => admin.role,
        }
    }
}

/// Role and permission set for a status lookup.
#[derive(Debug, Clone)]
pub struct RoleInfo {
    pub role: Role,
    pub permissions: Permissions,
}

/// Resolve a login attempt against both identity tables.
///
/// `users` takes precedence over `admin_users`; see the module docs for why
/// this ordering is load-bearing.
///
/// # Errors
///
/// - `AuthError::InvalidCredentials` for an unknown email, inactive account,
///   missing local credential, or password mismatch (indistinguishable).
/// - `AuthError::EmailNotVerified` for a correct customer password on an
///   unverified account (distinguishable, to enable a resend action).
pub async fn resolve_for_login(
    users: &UserRepository<'_>,
    admins: &AdminUserRepository<'_>,
    email: &Email,
    password: &str,
) -> Result<ResolvedIdentity, AuthError> {
    if let Some((user, credential)) = users.get_with_credential(email).await? {
        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        // A null credential marks an external-provider account; password
        // login must never succeed against it.
        let Some(hash) = credential else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.email_verified {
            return Err(AuthError::EmailNotVerified);
        }

        return Ok(ResolvedIdentity::Customer(user));
    }

    if let Some((admin, primary, legacy)) = admins.get_active_with_credentials(email).await? {
        // Rows imported from the old POS database still carry their hash in
        // the legacy column; check both.
        for hash in [primary, legacy].into_iter().flatten() {
            if verify_password(password, &hash).await? {
                return Ok(ResolvedIdentity::BackOffice(admin));
            }
        }
        return Err(AuthError::InvalidCredentials);
    }

    Err(AuthError::InvalidCredentials)
}

/// Resolve the role and permission set for an email (status lookup).
///
/// Checks `admin_users` first, then falls back to customers with the legacy
/// admin flag, which resolve to `admin` with all capabilities granted.
///
/// # Errors
///
/// Returns `AuthError::UserNotFound` if no back-office account or
/// admin-flagged customer exists for the email.
pub async fn resolve_role_for_email(
    users: &UserRepository<'_>,
    admins: &AdminUserRepository<'_>,
    email: &Email,
) -> Result<RoleInfo, AuthError> {
    if let Some(admin) = admins.get_by_email(email).await? {
        return Ok(RoleInfo {
            role: admin.role,
            permissions: admin.permissions,
        });
    }

    if let Some(user) = users.get_by_email(email).await?
        && user.is_admin
    {
        return Ok(RoleInfo {
            role: Role::Admin,
            permissions: Permissions::all_granted(ALL_CAPABILITIES),
        });
    }

    Err(AuthError::UserNotFound)
}
