//! `cl-cli migrate`

use sqlx::SqlitePool;

use super::CliError;

/// Apply all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<(), CliError> {
    copperlast_server::db::MIGRATOR.run(pool).await?;
    println!("migrations applied");
    Ok(())
}
