//! Domain types for the auth service.
//!
//! These types represent validated domain objects separate from database
//! row types.

pub mod admin_user;
pub mod session;
pub mod user;

pub use admin_user::AdminUser;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
