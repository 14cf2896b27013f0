//! Authentication extractors.
//!
//! Route guards are declared by adding an extractor to a handler's argument
//! list. [`CurrentPrincipal`] authenticates (401 on failure);
//! [`RequireStaff`] and [`RequireAdmin`] additionally authorize (403 on an
//! insufficient role). Handlers never check roles inline.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use copperlast_core::{Email, Role, UserId};

use crate::error::AppError;
use crate::services::tokens::{Claims, TokenError};
use crate::state::AppState;

/// Auth token cookie name.
pub const AUTH_COOKIE: &str = "cl_auth";

/// Auth cookie lifetime in seconds (7 days, matching the token TTL).
const AUTH_COOKIE_MAX_AGE: i64 = 7 * 24 * 60 * 60;

/// The authenticated principal for a request.
///
/// Verified from the `Authorization: Bearer` header, falling back to the
/// auth cookie. The header wins when both are present.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
}

impl From<Claims> for CurrentPrincipal {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id(),
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Guard: any authenticated principal with a staff-level role.
#[derive(Debug, Clone)]
pub struct RequireStaff(pub CurrentPrincipal);

/// Guard: any authenticated principal with the admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentPrincipal);

impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or(AppError::Token(TokenError::Missing))?;

        let claims = state.tokens().verify(&token).map_err(|e| {
            tracing::debug!("token rejected: {e}");
            AppError::Unauthorized
        })?;

        Ok(Self::from(claims))
    }
}

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = CurrentPrincipal::from_request_parts(parts, state).await?;
        if !principal.role.is_staff_level() {
            return Err(AppError::Forbidden);
        }
        Ok(Self(principal))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = CurrentPrincipal::from_request_parts(parts, state).await?;
        if principal.role != Role::Admin {
            return Err(AppError::Forbidden);
        }
        Ok(Self(principal))
    }
}

/// Pull the bearer token from the request, header first, cookie second.
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION)
        && let Ok(value) = value.to_str()
        && let Some(token) = value.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_owned());
    }

    cookie_value(parts, AUTH_COOKIE)
}

fn cookie_value(parts: &Parts, name: &str) -> Option<String> {
    let header = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_owned())
    })
}

/// Build the `Set-Cookie` value that installs the auth token.
#[must_use]
pub fn auth_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{AUTH_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={AUTH_COOKIE_MAX_AGE}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the `Set-Cookie` value that clears the auth token.
#[must_use]
pub fn clear_auth_cookie(secure: bool) -> String {
    let mut cookie = format!("{AUTH_COOKIE}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header_name: header::HeaderName, value: &str) -> Parts {
        Request::builder()
            .header(header_name, value)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_bearer_header_extraction() {
        let parts = parts_with(header::AUTHORIZATION, "Bearer abc.def.ghi");
        assert_eq!(extract_token(&parts).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_extraction() {
        let parts = parts_with(header::COOKIE, "cl_session=xyz; cl_auth=abc.def.ghi");
        assert_eq!(extract_token(&parts).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let parts = Request::builder()
            .header(header::AUTHORIZATION, "Bearer from-header")
            .header(header::COOKIE, "cl_auth=from-cookie")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        assert_eq!(extract_token(&parts).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_no_credentials() {
        let parts = parts_with(header::COOKIE, "other=value");
        assert_eq!(extract_token(&parts), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = auth_cookie("tok", false);
        assert!(cookie.starts_with("cl_auth=tok; "));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(!cookie.contains("Secure"));
        assert!(auth_cookie("tok", true).contains("Secure"));
        assert!(clear_auth_cookie(false).contains("Max-Age=0"));
    }
}
