//! Shared application state.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::services::email::EmailService;
use crate::services::tokens::TokenService;

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: AppConfig,
    pool: SqlitePool,
    tokens: TokenService,
    email: Option<EmailService>,
}

impl AppState {
    /// Create application state from loaded configuration.
    #[must_use]
    pub fn new(config: AppConfig, pool: SqlitePool, email: Option<EmailService>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret);
        Self {
            inner: Arc::new(Inner {
                config,
                pool,
                tokens,
                email,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }
}
