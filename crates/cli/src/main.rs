//! Operator CLI for the Copperlast auth service.
//!
//! Runs database migrations and manages back-office accounts, which have
//! no public self-registration path.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cl-cli", about = "Copperlast operator tooling", version)]
struct Cli {
    /// Database connection string.
    #[arg(long, env = "COPPERLAST_DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run pending database migrations.
    Migrate,

    /// Manage back-office accounts.
    Admin {
        #[command(subcommand)]
        command: commands::admin::AdminCommand,
    },
}

#[tokio::main]
async fn main() -> Result<(), commands::CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let pool =
        copperlast_server::db::create_pool(&secrecy::SecretString::from(cli.database_url)).await?;

    match cli.command {
        Command::Migrate => commands::migrate::run(&pool).await,
        Command::Admin { command } => commands::admin::run(&pool, command).await,
    }
}
