//! Password hashing and validation.
//!
//! bcrypt with cost 12. Hashing and verification run on the blocking thread
//! pool; they are CPU-bound and would otherwise stall the async runtime.

use super::AuthError;

/// bcrypt cost factor for new credentials.
pub const BCRYPT_COST: u32 = 12;

/// Minimum password length (legacy storefront minimum).
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length (bcrypt has a 72-byte limit).
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Hash a password with bcrypt.
///
/// The salt is generated per call, so two hashes of the same password
/// differ; `cost` defaults to [`BCRYPT_COST`].
///
/// # Errors
///
/// Returns `AuthError::Hash` if bcrypt fails.
pub async fn hash_password(password: &str, cost: Option<u32>) -> Result<String, AuthError> {
    let password = password.to_owned();
    let cost = cost.unwrap_or(BCRYPT_COST);

    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost).map_err(|_| AuthError::Hash))
        .await
        .map_err(|_| AuthError::Hash)?
}

/// Verify a password against a stored bcrypt hash.
///
/// Fails closed: an empty or malformed stored hash yields `false` rather
/// than an error, so a corrupted credential can never bypass the caller's
/// rejection path.
///
/// # Errors
///
/// Returns `AuthError::Hash` only if the blocking task itself fails.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let hash = hash.to_owned();

    tokio::task::spawn_blocking(move || match bcrypt::verify(password, &hash) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::warn!("stored credential could not be parsed: {e}");
            false
        }
    })
    .await
    .map_err(|_| AuthError::Hash)
}

/// Validate a password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` with the specific reason.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}
