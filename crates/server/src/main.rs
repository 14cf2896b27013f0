//! Server binary entry point.

#![cfg_attr(not(test), forbid(unsafe_code))]

use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use copperlast_server::config::AppConfig;
use copperlast_server::db;
use copperlast_server::middleware::session::create_session_layer;
use copperlast_server::services::email::EmailService;
use copperlast_server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("copperlast_server=info,tower_http=info")
            }),
        )
        .with(fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::MIGRATOR.run(&pool).await?;

    let session_store = SqliteStore::new(pool.clone());
    session_store.migrate().await?;
    let session_layer = create_session_layer(session_store, config.is_https());

    let email = match &config.email {
        Some(email_config) => Some(EmailService::new(email_config, &config.base_url)?),
        None => {
            tracing::warn!("SMTP not configured; transactional email is disabled");
            None
        }
    };

    let addr = config.socket_addr()?;
    let state = AppState::new(config, pool, email);
    let app = copperlast_server::app(state, session_layer);

    tracing::info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .unwrap_or_else(|e| tracing::error!("failed to install ctrl-c handler: {e}"));
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("failed to install terminate handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutting down");
}
