//! Session layer configuration.
//!
//! Cookie-backed server-side sessions, used by the storefront checkout flow
//! alongside the stateless bearer tokens. The session cookie is distinct
//! from the auth token cookie.

use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "cl_session";

/// Build the session layer over any session store.
///
/// Sessions expire after 7 days of inactivity, matching the bearer token
/// TTL.
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    secure: bool,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_path("/")
        .with_expiry(Expiry::OnInactivity(Duration::days(7)))
}
