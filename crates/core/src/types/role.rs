//! Access roles carried in bearer-token claims.

use serde::{Deserialize, Serialize};

/// Coarse access level for an authenticated principal.
///
/// `User` is a storefront customer. `Staff` and `Admin` are back-office
/// accounts; a legacy customer row flagged as admin also resolves to `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Storefront customer account.
    User,
    /// Back-office staff account.
    Staff,
    /// Full administrative access.
    Admin,
}

impl Role {
    /// Whether this role grants back-office (staff-level) access.
    #[must_use]
    pub const fn is_staff_level(self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }

    /// Roles that may be stored on a back-office account.
    #[must_use]
    pub const fn is_back_office(self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Staff => write!(f, "staff"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}
