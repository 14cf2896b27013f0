//! Business logic services.

pub mod auth;
pub mod email;
pub mod tokens;

pub use auth::{AuthError, AuthService};
pub use email::EmailService;
pub use tokens::TokenService;
