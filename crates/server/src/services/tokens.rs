//! Bearer token issuance and verification.
//!
//! HS256 JWTs signed with the server secret from configuration. Tokens are
//! not persisted; a token is trusted iff its signature verifies and it has
//! not expired. Role claims are computed server-side by the identity
//! resolver and never taken from client input.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use copperlast_core::{Email, Role, UserId};

/// TTL for login and session-bridged tokens: 7 days.
pub const LOGIN_TOKEN_TTL: Duration = Duration::days(7);

/// Token verification failures.
///
/// All variants map to 401; the client sees one generic message so the
/// failure mode does not become an oracle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// No token was presented.
    #[error("missing credentials")]
    Missing,

    /// Token is past its expiration.
    #[error("expired credentials")]
    Expired,

    /// Token is malformed or its signature doesn't verify.
    #[error("invalid credentials")]
    Invalid,

    /// Signing failed (configuration-level problem).
    #[error("token signing failed")]
    Signing,
}

/// Claims carried in a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the principal's numeric ID.
    pub sub: i64,
    /// Principal's email address.
    pub email: Email,
    /// Effective role computed at issuance.
    pub role: Role,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Subject as a typed user ID.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }
}

/// Issues and verifies signed bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a token service from the configured signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // No leeway: a token is invalid the moment its TTL elapses.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Issue a signed token for the given identity.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(
        &self,
        id: UserId,
        email: &Email,
        role: Role,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: id.as_i64(),
            email: email.clone(),
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            tracing::error!("failed to sign token: {e}");
            TokenError::Signing
        })
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for a token past its TTL and
    /// `TokenError::Invalid` for anything malformed or mis-signed.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}
