//! Test harness for end-to-end API tests.
//!
//! Builds the full application over an in-memory `SQLite` database and an
//! in-memory session store, and drives it with `tower::ServiceExt::oneshot`
//! so no port is bound.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use copperlast_core::{Email, Permissions, Role};
use copperlast_server::config::AppConfig;
use copperlast_server::db::MIGRATOR;
use copperlast_server::db::admin_users::AdminUserRepository;
use copperlast_server::db::users::UserRepository;
use copperlast_server::middleware::session::create_session_layer;
use copperlast_server::services::tokens::TokenService;
use copperlast_server::state::AppState;

/// Signing secret for tests; high-entropy so config validation accepts it.
const TEST_JWT_SECRET: &str = "kQ7vF2pX9zL4mW8rT1cJ6bN3hY5dG0aSuE8iO2pA";

/// Low bcrypt cost keeps seeded fixtures fast.
pub const TEST_BCRYPT_COST: u32 = 4;

/// A fully wired application over in-memory storage.
pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub tokens: TokenService,
}

impl TestApp {
    /// Spin up a fresh application with migrated, empty storage.
    pub async fn spawn() -> Self {
        // A single connection keeps the in-memory database alive and shared
        // across the whole test.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MIGRATOR.run(&pool).await.unwrap();

        let config = AppConfig {
            database_url: SecretString::from("sqlite::memory:"),
            host: "127.0.0.1".to_owned(),
            port: 0,
            base_url: "http://localhost:3000".to_owned(),
            jwt_secret: SecretString::from(TEST_JWT_SECRET),
            email: None,
        };

        let tokens = TokenService::new(&config.jwt_secret);
        let state = AppState::new(config, pool.clone(), None);
        let session_layer = create_session_layer(MemoryStore::default(), false);
        let router = copperlast_server::app(state, session_layer);

        Self {
            router,
            pool,
            tokens,
        }
    }

    /// Send a JSON POST.
    pub async fn post_json(&self, uri: &str, body: &Value) -> Response<Body> {
        self.request(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Send a JSON POST with extra headers (e.g. cookies or bearer tokens).
    pub async fn post_json_with(
        &self,
        uri: &str,
        body: &Value,
        headers: &[(header::HeaderName, String)],
    ) -> Response<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Send a GET.
    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Send a GET with extra headers.
    pub async fn get_with(
        &self,
        uri: &str,
        headers: &[(header::HeaderName, String)],
    ) -> Response<Body> {
        let mut builder = Request::get(uri);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Seed a customer account directly, bypassing the registration flow.
    pub async fn seed_user(&self, email: &str, password: &str, verified: bool) -> i64 {
        let email = Email::parse(email).unwrap();
        let hash = bcrypt::hash(password, TEST_BCRYPT_COST).unwrap();
        let user = UserRepository::new(&self.pool)
            .create(&email, Some(&hash), None, None, verified)
            .await
            .unwrap();
        user.id.as_i64()
    }

    /// Seed a back-office account directly.
    pub async fn seed_admin(
        &self,
        email: &str,
        password: &str,
        role: Role,
        capabilities: &[&str],
    ) -> i64 {
        let email = Email::parse(email).unwrap();
        let hash = bcrypt::hash(password, TEST_BCRYPT_COST).unwrap();
        let admin = AdminUserRepository::new(&self.pool)
            .create(&email, &hash, role, &Permissions::all_granted(capabilities))
            .await
            .unwrap();
        admin.id.as_i64()
    }

    /// Seed a customer account with no local credential, as an external
    /// identity provider would leave it.
    pub async fn seed_external_user(&self, email: &str) -> i64 {
        let email = Email::parse(email).unwrap();
        let user = UserRepository::new(&self.pool)
            .create(&email, None, None, None, true)
            .await
            .unwrap();
        user.id.as_i64()
    }

    /// Seed a back-office account carrying its hash only in the legacy
    /// `password` column, as rows imported from the old POS database do.
    pub async fn seed_legacy_admin(&self, email: &str, password: &str, role: Role) -> i64 {
        let hash = bcrypt::hash(password, TEST_BCRYPT_COST).unwrap();
        let now = chrono::Utc::now();
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO admin_users (email, password, role, permissions, created_at, updated_at) \
             VALUES (?, ?, ?, '{}', ?, ?) RETURNING id",
        )
        .bind(email)
        .bind(hash)
        .bind(role.to_string())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .unwrap();
        id
    }

    /// Both credential columns of a back-office row.
    pub async fn admin_credential_columns(&self, id: i64) -> (Option<String>, Option<String>) {
        sqlx::query_as("SELECT password_hash, password FROM admin_users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    /// Flip the legacy admin flag on a customer row.
    pub async fn set_user_admin_flag(&self, user_id: i64) {
        sqlx::query("UPDATE users SET is_admin = 1 WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    /// The most recently issued verification token for a user.
    pub async fn latest_verification_token(&self, user_id: i64) -> String {
        let (token,): (String,) = sqlx::query_as(
            "SELECT token FROM email_verification_tokens \
             WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .unwrap();
        token
    }

    /// The most recently issued reset token for a user.
    pub async fn latest_reset_token(&self, user_id: i64) -> String {
        let (token,): (String,) = sqlx::query_as(
            "SELECT token FROM password_reset_tokens \
             WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .unwrap();
        token
    }

    /// Number of reset tokens stored for any user.
    pub async fn reset_token_count(&self) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM password_reset_tokens")
            .fetch_one(&self.pool)
            .await
            .unwrap();
        count
    }

    /// Force a reset token into the expired state.
    pub async fn expire_reset_token(&self, token: &str) {
        sqlx::query("UPDATE password_reset_tokens SET expires_at = ? WHERE token = ?")
            .bind(chrono::Utc::now() - chrono::Duration::hours(2))
            .bind(token)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    /// The stored password hash for a customer account.
    pub async fn stored_password_hash(&self, user_id: i64) -> Option<String> {
        let (hash,): (Option<String>,) =
            sqlx::query_as("SELECT password_hash FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .unwrap();
        hash
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a status and return the parsed body.
pub async fn assert_status(response: Response<Body>, expected: StatusCode) -> Value {
    let status = response.status();
    let body = body_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {body}");
    body
}

/// Collect the cookie pairs set by a response (name=value only).
#[must_use]
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(ToOwned::to_owned)
        .collect()
}

/// Build a `Cookie` header value from collected cookie pairs.
#[must_use]
pub fn cookie_header(cookies: &[String]) -> String {
    cookies.join("; ")
}
