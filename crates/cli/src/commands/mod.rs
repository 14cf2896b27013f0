//! CLI subcommands.

pub mod admin;
pub mod migrate;

use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("repository error: {0}")]
    Repository(#[from] copperlast_server::db::RepositoryError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}
