//! Transactional email delivery over SMTP.
//!
//! All sends are best-effort: a delivery failure is logged and swallowed so
//! that an SMTP outage never turns a successful registration or reset
//! request into a 500. The service is optional; without SMTP configuration
//! the server runs and skips sends (links are still logged at debug level
//! for local development).

use askama::Template;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use thiserror::Error;

use copperlast_core::Email;

use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("invalid email configuration: {0}")]
    Config(String),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("failed to render template: {0}")]
    Template(#[from] askama::Error),

    #[error("failed to send email: {0}")]
    Send(#[from] lettre::transport::smtp::Error),
}

#[derive(Template)]
#[template(path = "email/verify_email.html")]
struct VerifyEmailHtml<'a> {
    verification_link: &'a str,
}

#[derive(Template)]
#[template(path = "email/verify_email.txt")]
struct VerifyEmailText<'a> {
    verification_link: &'a str,
}

#[derive(Template)]
#[template(path = "email/reset_password.html")]
struct ResetPasswordHtml<'a> {
    reset_link: &'a str,
}

#[derive(Template)]
#[template(path = "email/reset_password.txt")]
struct ResetPasswordText<'a> {
    reset_link: &'a str,
}

#[derive(Template)]
#[template(path = "email/account_recovery.html")]
struct AccountRecoveryHtml<'a> {
    email: &'a str,
    login_link: &'a str,
}

#[derive(Template)]
#[template(path = "email/account_recovery.txt")]
struct AccountRecoveryText<'a> {
    email: &'a str,
    login_link: &'a str,
}

/// Sends transactional emails via SMTP.
#[derive(Clone)]
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    base_url: String,
}

impl EmailService {
    /// Build a service from SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Config` if the relay host or from-address is
    /// malformed.
    pub fn new(config: &EmailConfig, base_url: &str) -> Result<Self, EmailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| EmailError::Config(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.expose_secret().to_owned(),
            ))
            .build();

        let from = config
            .from_address
            .parse()
            .map_err(|_| EmailError::Config(format!("invalid from address: {}", config.from_address)))?;

        Ok(Self {
            transport,
            from,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Send a verification email carrying a single-use link.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` on render, build, or transport failure.
    pub async fn send_verification_email(&self, to: &Email, token: &str) -> Result<(), EmailError> {
        let link = format!("{}/auth/verify-email?token={token}", self.base_url);

        let html = VerifyEmailHtml {
            verification_link: &link,
        }
        .render()?;
        let text = VerifyEmailText {
            verification_link: &link,
        }
        .render()?;

        self.send(to, "Verify your email address", html, text).await
    }

    /// Send a password reset email carrying a single-use link.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` on render, build, or transport failure.
    pub async fn send_password_reset(&self, to: &Email, token: &str) -> Result<(), EmailError> {
        let link = format!("{}/reset-password?token={token}", self.base_url);

        let html = ResetPasswordHtml { reset_link: &link }.render()?;
        let text = ResetPasswordText { reset_link: &link }.render()?;

        self.send(to, "Reset your password", html, text).await
    }

    /// Remind an account holder which email they registered with.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` on render, build, or transport failure.
    pub async fn send_account_recovery(&self, to: &Email) -> Result<(), EmailError> {
        let login_link = format!("{}/login", self.base_url);

        let html = AccountRecoveryHtml {
            email: to.as_str(),
            login_link: &login_link,
        }
        .render()?;
        let text = AccountRecoveryText {
            email: to.as_str(),
            login_link: &login_link,
        }
        .render()?;

        self.send(to, "Your account details", html, text).await
    }

    async fn send(
        &self,
        to: &Email,
        subject: &str,
        html: String,
        text: String,
    ) -> Result<(), EmailError> {
        let to_mailbox: Mailbox = to
            .as_str()
            .parse()
            .map_err(|_| EmailError::Config(format!("invalid recipient: {to}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))?;

        self.transport.send(message).await?;
        tracing::info!(recipient = %to, subject, "email sent");
        Ok(())
    }
}
