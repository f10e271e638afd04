// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! Drives the full router in-process. A [`TestClient`] behaves like a
//! browser: it stores cookies from `Set-Cookie` responses and sends them back.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;
use usher_api::auth::PermissionNode;
use usher_api::users::{User, UserStore};
use usher_api::{ApiServer, AppState};
use usher_config::UsherConfig;

use super::fixtures::UserFixtures;

// =============================================================================
// TestApp
// =============================================================================

/// A fully wired application.
#[derive(Clone)]
pub struct TestApp {
    /// Application state, for direct inspection.
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// Builds the app from a configuration with an in-memory store.
    pub fn new(config: UsherConfig) -> anyhow::Result<Self> {
        let state = AppState::builder().config(config).build()?;
        Ok(Self::from_state(state))
    }

    /// Builds the app with a custom user store.
    pub fn with_store(config: UsherConfig, store: Arc<dyn UserStore>) -> anyhow::Result<Self> {
        let state = AppState::builder()
            .config(config)
            .user_store(store)
            .build()?;
        Ok(Self::from_state(state))
    }

    /// Builds the app with a replacement permission map.
    pub fn with_permission_map(
        config: UsherConfig,
        map: PermissionNode<User>,
    ) -> anyhow::Result<Self> {
        let state = AppState::builder()
            .config(config)
            .permission_map(map)
            .build()?;
        Ok(Self::from_state(state))
    }

    fn from_state(state: AppState) -> Self {
        let router = ApiServer::new(state.clone()).router();
        Self { state, router }
    }

    /// A client with an empty cookie jar.
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookies: BTreeMap::new(),
        }
    }

    /// Registers a user and returns a signed-in client plus the user id.
    pub async fn signed_up(&self, email: &str, name: &str) -> anyhow::Result<(TestClient, String)> {
        let mut client = self.client();
        let response = client
            .post("/auth/register", UserFixtures::registration(email, name))
            .await?;
        anyhow::ensure!(
            response.status == StatusCode::CREATED,
            "registration failed: {} {}",
            response.status,
            response.body
        );
        let id = response.body["data"]["user"]["id"]
            .as_str()
            .context("registration response has no user id")?
            .to_string();
        Ok((client, id))
    }
}

// =============================================================================
// TestClient
// =============================================================================

/// A cookie-keeping client.
#[derive(Clone)]
pub struct TestClient {
    router: Router,
    cookies: BTreeMap<String, String>,
}

/// A collected response.
#[derive(Debug)]
pub struct TestResponse {
    /// Status code.
    pub status: StatusCode,
    /// Parsed JSON body, or `Value::Null` if the body is empty.
    pub body: Value,
    /// Raw `Set-Cookie` header values.
    pub set_cookies: Vec<String>,
}

impl TestResponse {
    /// The `error.code` field of an error body.
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }

    /// The `Set-Cookie` value for `name`, if one was sent.
    pub fn set_cookie(&self, name: &str) -> Option<&str> {
        let prefix = format!("{}=", name);
        self.set_cookies
            .iter()
            .find(|c| c.starts_with(&prefix))
            .map(String::as_str)
    }
}

impl TestClient {
    /// Sends a GET request.
    pub async fn get(&mut self, path: &str) -> anyhow::Result<TestResponse> {
        self.send(Method::GET, path, None).await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post(&mut self, path: &str, body: Value) -> anyhow::Result<TestResponse> {
        self.send(Method::POST, path, Some(body)).await
    }

    /// Sends a PUT request with a JSON body.
    pub async fn put(&mut self, path: &str, body: Value) -> anyhow::Result<TestResponse> {
        self.send(Method::PUT, path, Some(body)).await
    }

    /// Sends a PATCH request with a JSON body.
    pub async fn patch(&mut self, path: &str, body: Value) -> anyhow::Result<TestResponse> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    /// Returns the stored raw cookie value.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Stores a raw cookie value, as a browser would.
    pub fn set_cookie(&mut self, name: &str, value: impl Into<String>) {
        self.cookies.insert(name.to_string(), value.into());
    }

    /// Drops a stored cookie.
    pub fn remove_cookie(&mut self, name: &str) {
        self.cookies.remove(name);
    }

    /// Sends a request, applying and updating stored cookies.
    pub async fn send(
        &mut self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> anyhow::Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(path);
        if !self.cookies.is_empty() {
            let header_value = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, header_value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        for cookie in &set_cookies {
            self.absorb(cookie);
        }

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };

        Ok(TestResponse {
            status,
            body,
            set_cookies,
        })
    }

    fn absorb(&mut self, set_cookie: &str) {
        let mut attributes = set_cookie.split(';').map(str::trim);
        let Some((name, value)) = attributes.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        let expired = attributes.any(|a| a.eq_ignore_ascii_case("Max-Age=0"));
        if expired || value.is_empty() {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.to_string());
        }
    }
}
