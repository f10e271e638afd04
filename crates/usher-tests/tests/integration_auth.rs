// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Authentication Integration Tests
//!
//! Drives the credential lifecycle over HTTP with cookies:
//!
//! - `test_register_*` / `test_login_*`: issuing the token pair
//! - `test_refresh_*`: rotating the pair
//! - `test_logout_*`: clearing cookies
//! - `test_confirm_*`: step-up password confirmation

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use usher_api::auth::TokenPurpose;
use usher_tests::prelude::*;

fn app() -> TestApp {
    init_test_logging();
    TestApp::new(ConfigFixtures::standard()).unwrap()
}

// =============================================================================
// Register / Login
// =============================================================================

#[tokio::test]
async fn test_register_sets_http_only_cookies() {
    let app = app();
    let mut client = app.client();

    let response = client
        .post("/auth/register", UserFixtures::registration("ada@example.com", "Ada"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::CREATED);
    for name in ["access_token", "refresh_token"] {
        let cookie = response.set_cookie(name).unwrap();
        assert!(cookie.contains("HttpOnly"), "{} not HttpOnly: {}", name, cookie);
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
    }
    assert!(response.set_cookie("password_confirmation").is_none());

    // tokens never appear in the body
    let body = response.body.to_string();
    assert!(!body.contains(client.cookie("access_token").unwrap()));
    assert_eq!(
        response.body["data"]["user"]["permissions"],
        json!(["user:read:own", "user:update:own"])
    );
    assert!(response.body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_admin_email_gets_every_permission() {
    let app = app();
    let mut client = app.client();

    let response = client
        .post("/auth/register", UserFixtures::registration(ADMIN_EMAIL, "Root"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        response.body["data"]["user"]["permissions"]
            .as_array()
            .unwrap()
            .len(),
        app.state.permissions().get_all_permissions().len()
    );
}

#[tokio::test]
async fn test_register_rejects_invalid_fields() {
    let app = app();
    let mut client = app.client();

    let response = client
        .post(
            "/auth/register",
            json!({"email": "nope", "name": " ", "password": "short"}),
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.error_code(), Some("VALIDATION_ERROR"));
    assert_eq!(
        response.body["error"]["details"]["fields"]
            .as_array()
            .map(Vec::len),
        Some(3)
    );
    assert!(client.cookie("access_token").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = app();
    app.signed_up("dup@example.com", "First").await.unwrap();

    let response = app
        .client()
        .post("/auth/register", UserFixtures::registration("DUP@example.com", "Second"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = app();
    app.signed_up("bob@example.com", "Bob").await.unwrap();
    let mut client = app.client();

    let response = client
        .post(
            "/auth/login",
            json!({"email": "bob@example.com", "password": "not the password"}),
        )
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(client.cookie("access_token").is_none());

    let response = client
        .post("/auth/login", UserFixtures::login("nobody@example.com"))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_then_access_protected_route() {
    let app = app();
    app.signed_up("cy@example.com", "Cy").await.unwrap();
    let mut client = app.client();

    let response = client.get("/users/me").await.unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), Some("UNAUTHORIZED"));

    let response = client
        .post("/auth/login", UserFixtures::login("cy@example.com"))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"]["access_expires_at"].as_i64().unwrap() > 0);

    let response = client.get("/users/me").await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["email"], "cy@example.com");
}

#[tokio::test]
async fn test_health_is_public() {
    let response = app().client().get("/health").await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
}

// =============================================================================
// Token Validation
// =============================================================================

#[tokio::test]
async fn test_tampered_access_cookie_is_rejected() {
    let app = app();
    let (mut client, _) = app.signed_up("eve@example.com", "Eve").await.unwrap();

    let original = client.cookie("access_token").unwrap().to_string();
    client.set_cookie("access_token", format!("{}x", original));

    let response = client.get("/users/me").await.unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_cannot_authenticate_requests() {
    let app = app();
    let (_, user_id) = app.signed_up("fay@example.com", "Fay").await.unwrap();

    // a validly signed cookie carrying a refresh token in the access slot
    let refresh = app.state.tokens.issue(TokenPurpose::RefreshToken, &user_id).unwrap();
    let jar = app.state.cookies.set(
        axum_extra_jar(&app),
        TokenPurpose::AccessToken,
        refresh.token,
    );
    let mut client = app.client();
    client.set_cookie("access_token", signed_value(jar, "access_token"));

    let response = client.get("/users/me").await.unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_access_token_is_unauthorized() {
    init_test_logging();
    let app = TestApp::new(ConfigFixtures::with_access_duration(1)).unwrap();
    let (mut client, _) = app.signed_up("gus@example.com", "Gus").await.unwrap();
    tokio::time::sleep(Duration::from_millis(2100)).await;

    let response = client.get("/users/me").await.unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // the refresh token is unaffected
    let response = client.post("/auth/refresh", json!({})).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_store_failure_propagates() {
    init_test_logging();
    let store = Arc::new(FlakyUserStore::new());
    let app = TestApp::with_store(ConfigFixtures::standard(), store.clone()).unwrap();
    let (mut client, _) = app.signed_up("hal@example.com", "Hal").await.unwrap();

    store.set_failing(true);
    let response = client.get("/users/me").await.unwrap();
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error_code(), Some("INTERNAL_ERROR"));
    assert!(store.lookups() > 0);

    store.set_failing(false);
    let response = client.get("/users/me").await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
}

// =============================================================================
// Refresh / Logout
// =============================================================================

#[tokio::test]
async fn test_refresh_rotates_both_cookies() {
    let app = app();
    let (mut client, _) = app.signed_up("ivy@example.com", "Ivy").await.unwrap();

    let response = client.post("/auth/refresh", json!({})).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.set_cookie("access_token").is_some());
    assert!(response.set_cookie("refresh_token").is_some());

    let response = client.get("/users/me").await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_without_cookie_is_unauthorized() {
    let app = app();
    let (mut client, _) = app.signed_up("jo@example.com", "Jo").await.unwrap();
    client.remove_cookie("refresh_token");

    let response = client.post("/auth/refresh", json!({})).await.unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let app = app();
    let (mut client, _) = app.signed_up("kim@example.com", "Kim").await.unwrap();

    let response = client.post("/auth/logout", json!({})).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    for name in ["access_token", "refresh_token"] {
        let cookie = response.set_cookie(name).unwrap();
        assert!(cookie.contains("Max-Age=0"), "{} not cleared: {}", name, cookie);
    }
    assert!(client.cookie("access_token").is_none());

    let response = client.get("/users/me").await.unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Password Confirmation
// =============================================================================

#[tokio::test]
async fn test_confirm_change_password_flow() {
    let app = app();
    let (mut client, _) = app.signed_up("lee@example.com", "Lee").await.unwrap();
    let new_password = json!({"new_password": "a brand new secret"});

    // no confirmation cookie yet
    let response = client.put("/users/me/password", new_password.clone()).await.unwrap();
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = client
        .post("/auth/confirm-password", json!({"password": "wrong"}))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(client.cookie("password_confirmation").is_none());

    let response = client
        .post("/auth/confirm-password", json!({"password": PASSWORD}))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"]["expires_at"].as_i64().is_some());
    assert!(client.cookie("password_confirmation").is_some());

    let response = client.put("/users/me/password", new_password).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert!(client.cookie("password_confirmation").is_none());

    let mut fresh = app.client();
    let response = fresh
        .post("/auth/login", UserFixtures::login("lee@example.com"))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let response = fresh
        .post(
            "/auth/login",
            json!({"email": "lee@example.com", "password": "a brand new secret"}),
        )
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_confirmation_is_bound_to_its_subject() {
    let app = app();
    let (mut mallory, _) = app.signed_up("mal@example.com", "Mal").await.unwrap();
    let (mut victim, _) = app.signed_up("vic@example.com", "Vic").await.unwrap();

    let response = mallory
        .post("/auth/confirm-password", json!({"password": PASSWORD}))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);

    // replaying another user's confirmation cookie fails the subject check
    let stolen = mallory.cookie("password_confirmation").unwrap().to_string();
    victim.set_cookie("password_confirmation", stolen);
    let response = victim
        .put("/users/me/password", json!({"new_password": "hijacked password"}))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_confirm_requires_authentication() {
    let response = app()
        .client()
        .post("/auth/confirm-password", json!({"password": PASSWORD}))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Helpers
// =============================================================================

fn axum_extra_jar(app: &TestApp) -> axum_extra::extract::cookie::SignedCookieJar {
    axum_extra::extract::cookie::SignedCookieJar::new(app.state.cookies.key().clone())
}

fn signed_value(jar: axum_extra::extract::cookie::SignedCookieJar, name: &str) -> String {
    use axum::response::IntoResponse;

    let response = jar.into_response();
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|c| c.strip_prefix(&prefix))
        .and_then(|rest| rest.split(';').next())
        .unwrap()
        .to_string()
}
