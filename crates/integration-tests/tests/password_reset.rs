//! Password recovery flows and single-use token semantics.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use copperlast_integration_tests::{TestApp, assert_status};

#[tokio::test]
async fn reset_flow_rotates_credential() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("shopper@example.com", "old-password", true).await;

    let response = app
        .post_json("/auth/forgot-password", &json!({ "email": "shopper@example.com" }))
        .await;
    assert_status(response, StatusCode::OK).await;

    let token = app.latest_reset_token(user_id).await;

    // Non-consuming validity check.
    let response = app.get(&format!("/auth/reset-password?token={token}")).await;
    assert_status(response, StatusCode::OK).await;
    let response = app.get(&format!("/auth/reset-password?token={token}")).await;
    assert_status(response, StatusCode::OK).await;

    let response = app
        .post_json(
            "/auth/reset-password",
            &json!({ "token": token, "password": "new-password" }),
        )
        .await;
    assert_status(response, StatusCode::OK).await;

    // Old credential is gone, new one works.
    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "shopper@example.com", "password": "old-password" }),
        )
        .await;
    assert_status(response, StatusCode::UNAUTHORIZED).await;

    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "shopper@example.com", "password": "new-password" }),
        )
        .await;
    assert_status(response, StatusCode::OK).await;

    // The token is spent.
    let response = app.get(&format!("/auth/reset-password?token={token}")).await;
    assert_status(response, StatusCode::BAD_REQUEST).await;
    let response = app
        .post_json(
            "/auth/reset-password",
            &json!({ "token": token, "password": "another-password" }),
        )
        .await;
    assert_status(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn forgot_password_does_not_reveal_accounts() {
    let app = TestApp::spawn().await;
    app.seed_user("shopper@example.com", "hunter22", true).await;

    let known = app
        .post_json("/auth/forgot-password", &json!({ "email": "shopper@example.com" }))
        .await;
    let unknown = app
        .post_json("/auth/forgot-password", &json!({ "email": "nobody@example.com" }))
        .await;

    let a = assert_status(known, StatusCode::OK).await;
    let b = assert_status(unknown, StatusCode::OK).await;
    assert_eq!(a, b);

    // Only the real account got a token.
    assert_eq!(app.reset_token_count().await, 1);
}

#[tokio::test]
async fn expired_reset_token_leaves_credential_unchanged() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("shopper@example.com", "hunter22", true).await;

    app.post_json("/auth/forgot-password", &json!({ "email": "shopper@example.com" }))
        .await;
    let token = app.latest_reset_token(user_id).await;
    let hash_before = app.stored_password_hash(user_id).await;

    app.expire_reset_token(&token).await;

    let response = app.get(&format!("/auth/reset-password?token={token}")).await;
    assert_status(response, StatusCode::BAD_REQUEST).await;

    let response = app
        .post_json(
            "/auth/reset-password",
            &json!({ "token": token, "password": "new-password" }),
        )
        .await;
    assert_status(response, StatusCode::BAD_REQUEST).await;

    assert_eq!(app.stored_password_hash(user_id).await, hash_before);
    let response = app
        .post_json(
            "/auth/login",
            &json!({ "email": "shopper@example.com", "password": "hunter22" }),
        )
        .await;
    assert_status(response, StatusCode::OK).await;
}

#[tokio::test]
async fn weak_replacement_password_does_not_consume_token() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("shopper@example.com", "hunter22", true).await;

    app.post_json("/auth/forgot-password", &json!({ "email": "shopper@example.com" }))
        .await;
    let token = app.latest_reset_token(user_id).await;

    let response = app
        .post_json(
            "/auth/reset-password",
            &json!({ "token": token, "password": "short" }),
        )
        .await;
    assert_status(response, StatusCode::BAD_REQUEST).await;

    // The token survives the rejected attempt.
    let response = app.get(&format!("/auth/reset-password?token={token}")).await;
    assert_status(response, StatusCode::OK).await;
}

#[tokio::test]
async fn concurrent_consumption_succeeds_exactly_once() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("shopper@example.com", "hunter22", true).await;

    app.post_json("/auth/forgot-password", &json!({ "email": "shopper@example.com" }))
        .await;
    let token = app.latest_reset_token(user_id).await;

    let body_one = json!({ "token": token, "password": "password-one" });
    let body_two = json!({ "token": token, "password": "password-two" });
    let first = app.post_json("/auth/reset-password", &body_one);
    let second = app.post_json("/auth/reset-password", &body_two);

    let (first, second) = tokio::join!(first, second);
    let statuses = [first.status(), second.status()];

    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::OK).count(),
        1,
        "exactly one consumer must win, got {statuses:?}"
    );
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::BAD_REQUEST)
            .count(),
        1
    );
}

#[tokio::test]
async fn new_reset_token_invalidates_prior_unused_one() {
    let app = TestApp::spawn().await;
    let user_id = app.seed_user("shopper@example.com", "hunter22", true).await;

    app.post_json("/auth/forgot-password", &json!({ "email": "shopper@example.com" }))
        .await;
    let first = app.latest_reset_token(user_id).await;

    app.post_json("/auth/forgot-password", &json!({ "email": "shopper@example.com" }))
        .await;
    let second = app.latest_reset_token(user_id).await;
    assert_ne!(first, second);

    let response = app.get(&format!("/auth/reset-password?token={first}")).await;
    assert_status(response, StatusCode::BAD_REQUEST).await;
    let response = app.get(&format!("/auth/reset-password?token={second}")).await;
    assert_status(response, StatusCode::OK).await;
}

#[tokio::test]
async fn forgot_email_answers_uniformly() {
    let app = TestApp::spawn().await;
    app.seed_user("shopper@example.com", "hunter22", true).await;

    let known = app
        .post_json("/auth/forgot-email", &json!({ "email": "shopper@example.com" }))
        .await;
    let unknown = app
        .post_json("/auth/forgot-email", &json!({ "email": "nobody@example.com" }))
        .await;

    let a = assert_status(known, StatusCode::OK).await;
    let b = assert_status(unknown, StatusCode::OK).await;
    assert_eq!(a, b);
}
