//! Session-related types.
//!
//! Types stored in the cookie session for authentication state.

use serde::{Deserialize, Serialize};

use copperlast_core::{Email, Role, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Principal's database ID.
    pub id: UserId,
    /// Principal's email address.
    pub email: Email,
    /// Effective role at login time.
    pub role: Role,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in principal.
    pub const CURRENT_USER: &str = "current_user";
}
