//! Application configuration from environment variables.
//!
//! Variables are prefixed `COPPERLAST_`. The token signing secret is
//! validated at startup; a missing, placeholder, or low-entropy secret
//! refuses to boot rather than running with guessable keys.

use std::env;
use std::net::SocketAddr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Minimum signing secret length in characters.
const MIN_SECRET_LENGTH: usize = 32;

/// Minimum Shannon entropy in bits per character for the signing secret.
const MIN_SECRET_ENTROPY: f64 = 3.3;

/// Placeholder values that must never be accepted as a signing secret.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "changeme",
    "change-me",
    "secret",
    "password",
    "your-secret-here",
    "your-256-bit-secret",
    "jwt-secret",
    "dev-secret",
    "test-secret",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: String, reason: String },

    #[error("refusing to start: {0}")]
    WeakSecret(String),
}

/// SMTP delivery configuration. Optional; without it email sends are skipped.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub from_address: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: SecretString,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Public base URL used in emailed links.
    pub base_url: String,
    /// Token signing secret (validated).
    pub jwt_secret: SecretString,
    /// SMTP configuration, if delivery is enabled.
    pub email: Option<EmailConfig>,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for missing variables, unparseable values, or a
    /// weak signing secret.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("COPPERLAST_DATABASE_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingVar("COPPERLAST_DATABASE_URL".into()))?;

        let host = env::var("COPPERLAST_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());

        let port = match env::var("COPPERLAST_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar {
                name: "COPPERLAST_PORT".into(),
                reason: format!("not a valid port number: {raw}"),
            })?,
            Err(_) => 3000,
        };

        let base_url = env::var("COPPERLAST_BASE_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}"));
        url::Url::parse(&base_url).map_err(|e| ConfigError::InvalidVar {
            name: "COPPERLAST_BASE_URL".into(),
            reason: e.to_string(),
        })?;

        let jwt_secret = env::var("COPPERLAST_JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("COPPERLAST_JWT_SECRET".into()))?;
        validate_secret(&jwt_secret)?;
        let jwt_secret = SecretString::from(jwt_secret);

        let email = load_email_config()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            jwt_secret,
            email,
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidVar` if host/port don't form an address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidVar {
                name: "COPPERLAST_HOST".into(),
                reason: format!("cannot bind {}:{}", self.host, self.port),
            })
    }

    /// Whether the public base URL is served over HTTPS. Controls the
    /// `Secure` attribute on the auth cookie.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn load_email_config() -> Result<Option<EmailConfig>, ConfigError> {
    let Ok(smtp_host) = env::var("COPPERLAST_SMTP_HOST") else {
        return Ok(None);
    };

    let smtp_port = match env::var("COPPERLAST_SMTP_PORT") {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidVar {
            name: "COPPERLAST_SMTP_PORT".into(),
            reason: format!("not a valid port number: {raw}"),
        })?,
        Err(_) => 587,
    };

    let smtp_username = env::var("COPPERLAST_SMTP_USERNAME")
        .map_err(|_| ConfigError::MissingVar("COPPERLAST_SMTP_USERNAME".into()))?;
    let smtp_password = env::var("COPPERLAST_SMTP_PASSWORD")
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingVar("COPPERLAST_SMTP_PASSWORD".into()))?;
    let from_address = env::var("COPPERLAST_SMTP_FROM")
        .map_err(|_| ConfigError::MissingVar("COPPERLAST_SMTP_FROM".into()))?;

    Ok(Some(EmailConfig {
        smtp_host,
        smtp_port,
        smtp_username,
        smtp_password,
        from_address,
    }))
}

/// Reject secrets that are short, well-known placeholders, or low-entropy.
fn validate_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::WeakSecret(format!(
            "COPPERLAST_JWT_SECRET must be at least {MIN_SECRET_LENGTH} characters"
        )));
    }

    let lowered = secret.to_ascii_lowercase();
    if PLACEHOLDER_SECRETS.iter().any(|p| lowered.contains(p)) {
        return Err(ConfigError::WeakSecret(
            "COPPERLAST_JWT_SECRET looks like a placeholder value".into(),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_SECRET_ENTROPY {
        return Err(ConfigError::WeakSecret(format!(
            "COPPERLAST_JWT_SECRET entropy too low ({entropy:.2} bits/char)"
        )));
    }

    Ok(())
}

/// Shannon entropy in bits per character.
#[allow(clippy::cast_precision_loss)]
fn shannon_entropy(s: &str) -> f64 {
    let len = s.chars().count();
    if len == 0 {
        return 0.0;
    }

    let mut counts = std::collections::HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0usize) += 1;
    }

    counts
        .values()
        .map(|&count| {
            let p = count as f64 / len as f64;
            -p * p.log2()
        })
        .sum()
}
