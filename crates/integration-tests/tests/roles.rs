//! Role resolution, route guards, and the session bridge.

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use serde_json::json;

use copperlast_core::{AdminUserId, Role};
use copperlast_integration_tests::{
    TEST_BCRYPT_COST, TestApp, assert_status, body_json, cookie_header, set_cookies,
};
use copperlast_server::db::admin_users::AdminUserRepository;

async fn login_token(app: &TestApp, email: &str, password: &str) -> String {
    let response = app
        .post_json("/auth/login", &json!({ "email": email, "password": password }))
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    body["token"].as_str().unwrap().to_owned()
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

#[tokio::test]
async fn staff_login_carries_staff_role() {
    let app = TestApp::spawn().await;
    app.seed_admin("clerk@example.com", "hunter22", Role::Staff, &["orders", "pos"])
        .await;

    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "clerk@example.com", "password": "hunter22" }),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["role"], "staff");
    assert_eq!(body["permissions"]["orders"], true);

    let claims = app.tokens.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.role, Role::Staff);
}

#[tokio::test]
async fn legacy_credential_column_still_authenticates() {
    let app = TestApp::spawn().await;
    app.seed_legacy_admin("pos@example.com", "hunter22", Role::Staff)
        .await;

    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "pos@example.com", "password": "hunter22" }),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["role"], "staff");
    let claims = app.tokens.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.role, Role::Staff);

    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "pos@example.com", "password": "wrong" }),
        )
        .await;
    assert_status(response, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn password_rotation_retires_legacy_credential() {
    let app = TestApp::spawn().await;
    let id = app
        .seed_legacy_admin("pos@example.com", "old-password", Role::Staff)
        .await;

    let hash = bcrypt::hash("new-password", TEST_BCRYPT_COST).unwrap();
    AdminUserRepository::new(&app.pool)
        .set_password(AdminUserId::new(id), &hash)
        .await
        .unwrap();

    // The legacy column is cleared, not left as a second valid credential.
    let (primary, legacy) = app.admin_credential_columns(id).await;
    assert!(primary.is_some());
    assert_eq!(legacy, None);

    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "pos@example.com", "password": "old-password" }),
        )
        .await;
    assert_status(response, StatusCode::UNAUTHORIZED).await;

    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "pos@example.com", "password": "new-password" }),
        )
        .await;
    assert_status(response, StatusCode::OK).await;
}

#[tokio::test]
async fn duplicate_email_resolves_to_customer_on_login() {
    let app = TestApp::spawn().await;
    app.seed_user("dual@example.com", "customer-pass", true).await;
    app.seed_admin("dual@example.com", "admin-pass", Role::Admin, &[])
        .await;

    // The customer row wins; its password is the only one that works.
    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "dual@example.com", "password": "customer-pass" }),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    let claims = app.tokens.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.role, Role::User);

    // The back-office credential is unreachable through login.
    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "dual@example.com", "password": "admin-pass" }),
        )
        .await;
    assert_status(response, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn check_status_prefers_back_office_table() {
    let app = TestApp::spawn().await;

    // Same email: staff in admin_users, legacy admin flag on the customer.
    let user_id = app.seed_user("dual@example.com", "hunter22", true).await;
    app.set_user_admin_flag(user_id).await;
    app.seed_admin("dual@example.com", "hunter22", Role::Staff, &["pos"])
        .await;

    let response = app
        .post_json("/admin/check-status", &json!({ "email": "dual@example.com" }))
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["role"], "staff");
    assert_eq!(body["permissions"]["pos"], true);
    assert!(body["permissions"].get("orders").is_none());
}

#[tokio::test]
async fn check_status_falls_back_to_legacy_admin_flag() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("owner@example.com", "hunter22", true).await;
    app.set_user_admin_flag(user_id).await;

    let response = app
        .post_json("/admin/check-status", &json!({ "email": "owner@example.com" }))
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["role"], "admin");
    assert_eq!(body["permissions"]["orders"], true);
    assert_eq!(body["permissions"]["settings"], true);
}

#[tokio::test]
async fn check_status_unknown_email_is_404() {
    let app = TestApp::spawn().await;
    app.seed_user("plain@example.com", "hunter22", true).await;

    // Unknown email and plain customer both have no back-office standing.
    let response = app
        .post_json("/admin/check-status", &json!({ "email": "nobody@example.com" }))
        .await;
    assert_status(response, StatusCode::NOT_FOUND).await;

    let response = app
        .post_json("/admin/check-status", &json!({ "email": "plain@example.com" }))
        .await;
    assert_status(response, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn admin_routes_enforce_role_guards() {
    let app = TestApp::spawn().await;
    app.seed_admin("clerk@example.com", "hunter22", Role::Staff, &[]).await;
    app.seed_admin("boss@example.com", "hunter22", Role::Admin, &[]).await;

    let staff_token = login_token(&app, "clerk@example.com", "hunter22").await;
    let admin_token = login_token(&app, "boss@example.com", "hunter22").await;

    // Unauthenticated: 401.
    let response = app.get("/admin/users").await;
    assert_status(response, StatusCode::UNAUTHORIZED).await;

    // Authenticated but insufficient: 403.
    let response = app.get_with("/admin/users", &[bearer(&staff_token)]).await;
    assert_status(response, StatusCode::FORBIDDEN).await;

    // Admin: 200.
    let response = app.get_with("/admin/users", &[bearer(&admin_token)]).await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 2);

    // Dashboard is staff-level: both succeed.
    let response = app
        .get_with("/admin/dashboard", &[bearer(&staff_token)])
        .await;
    assert_status(response, StatusCode::OK).await;
    let response = app
        .get_with("/admin/dashboard", &[bearer(&admin_token)])
        .await;
    assert_status(response, StatusCode::OK).await;

    // Garbage tokens are a 401, not a 500.
    let response = app
        .get_with("/admin/dashboard", &[bearer("not.a.token")])
        .await;
    assert_status(response, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn auth_cookie_works_without_header() {
    let app = TestApp::spawn().await;
    app.seed_admin("clerk@example.com", "hunter22", Role::Staff, &[]).await;

    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "clerk@example.com", "password": "hunter22" }),
        )
        .await;
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("cl_auth=")));

    let response = app
        .get_with(
            "/admin/dashboard",
            &[(header::COOKIE, cookie_header(&cookies))],
        )
        .await;
    assert_status(response, StatusCode::OK).await;
}

#[tokio::test]
async fn session_bridge_issues_staff_token() {
    let app = TestApp::spawn().await;
    app.seed_user("shopper@example.com", "hunter22", true).await;

    // No session yet.
    let response = app.get("/auth/session").await;
    let body = body_json(response).await;
    assert!(body.is_null());

    let response = app.post_json("/auth/session-to-jwt", &json!({})).await;
    assert_status(response, StatusCode::UNAUTHORIZED).await;

    // Log in to establish the cookie session.
    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "shopper@example.com", "password": "hunter22" }),
        )
        .await;
    let cookies = set_cookies(&response);
    let cookie = (header::COOKIE, cookie_header(&cookies));

    let response = app.get_with("/auth/session", &[cookie.clone()]).await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["email"], "shopper@example.com");

    // Bridge the session into a bearer token.
    let response = app
        .post_json_with("/auth/session-to-jwt", &json!({}), &[cookie.clone()])
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    let claims = app.tokens.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.role, Role::Staff);

    // Logout tears the session down.
    let response = app
        .post_json_with("/auth/logout", &json!({}), &[cookie.clone()])
        .await;
    assert_status(response, StatusCode::OK).await;
    let response = app
        .post_json_with("/auth/session-to-jwt", &json!({}), &[cookie])
        .await;
    assert_status(response, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn inactive_accounts_cannot_login() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("gone@example.com", "hunter22", true).await;
    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(user_id)
        .execute(&app.pool)
        .await
        .unwrap();

    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "gone@example.com", "password": "hunter22" }),
        )
        .await;
    assert_status(response, StatusCode::UNAUTHORIZED).await;
}
