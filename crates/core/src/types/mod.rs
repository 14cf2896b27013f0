//! Core types for Copperlast.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod permissions;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use permissions::Permissions;
pub use role::Role;
