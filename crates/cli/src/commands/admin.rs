//! `cl-cli admin` — back-office account management.
//!
//! Back-office accounts have no self-registration endpoint; this is the
//! only way they come into existence.

use clap::Subcommand;
use sqlx::SqlitePool;

use copperlast_core::{Email, Permissions, Role};
use copperlast_server::db::admin_users::AdminUserRepository;

use super::CliError;

/// bcrypt cost for operator-created credentials, matching the server.
const BCRYPT_COST: u32 = 12;

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Create a back-office account.
    Create {
        /// Account email address.
        #[arg(long)]
        email: String,

        /// Initial password (will be bcrypt-hashed).
        #[arg(long)]
        password: String,

        /// Account role: `staff` or `admin`.
        #[arg(long, default_value = "staff")]
        role: String,

        /// Capabilities to grant, comma-separated (e.g. `orders,pos`).
        #[arg(long, value_delimiter = ',')]
        permissions: Vec<String>,
    },

    /// List back-office accounts.
    List,

    /// Rotate an account's password by ID.
    SetPassword {
        /// Account ID.
        #[arg(long)]
        id: i64,

        /// Replacement password (will be bcrypt-hashed).
        #[arg(long)]
        password: String,
    },

    /// Soft-delete a back-office account by ID.
    Delete {
        /// Account ID.
        #[arg(long)]
        id: i64,
    },
}

pub async fn run(pool: &SqlitePool, command: AdminCommand) -> Result<(), CliError> {
    let repo = AdminUserRepository::new(pool);

    match command {
        AdminCommand::Create {
            email,
            password,
            role,
            permissions,
        } => {
            let email =
                Email::parse(&email).map_err(|e| CliError::InvalidInput(e.to_string()))?;
            let role: Role = role
                .parse()
                .map_err(|_| CliError::InvalidInput(format!("invalid role: {role}")))?;
            if !role.is_back_office() {
                return Err(CliError::InvalidInput(
                    "back-office accounts must be staff or admin".to_owned(),
                ));
            }

            let mut perms = Permissions::empty();
            for capability in permissions {
                perms.set(capability, true);
            }

            let hash = bcrypt::hash(&password, BCRYPT_COST)?;
            let created = repo.create(&email, &hash, role, &perms).await?;
            println!("created {} ({}) id={}", created.email, created.role, created.id);
        }
        AdminCommand::List => {
            let accounts = repo.list_all().await?;
            if accounts.is_empty() {
                println!("no back-office accounts");
            }
            for account in accounts {
                println!(
                    "{:>6}  {:<40}  {:<5}  {}",
                    account.id,
                    account.email,
                    account.role,
                    if account.is_active { "active" } else { "inactive" },
                );
            }
        }
        AdminCommand::SetPassword { id, password } => {
            let hash = bcrypt::hash(&password, BCRYPT_COST)?;
            repo.set_password(copperlast_core::AdminUserId::new(id), &hash)
                .await?;
            println!("password updated for account {id}");
        }
        AdminCommand::Delete { id } => {
            repo.soft_delete(copperlast_core::AdminUserId::new(id)).await?;
            println!("deleted account {id}");
        }
    }

    Ok(())
}
