// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Cookie authentication middleware.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use tower::{Layer, Service};

use crate::auth::{AuthContext, CredentialCookies, TokenPurpose, TokenService};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::users::{User, UserStore};

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for cookie authentication.
///
/// Reads the access token from its signed cookie, validates it, loads the
/// user and attaches an [`AuthContext`]. Requests to public paths pass
/// through untouched.
#[derive(Clone)]
pub struct AuthLayer {
    tokens: TokenService,
    cookies: CredentialCookies,
    users: Arc<dyn UserStore>,
    public_paths: Arc<HashSet<String>>,
}

impl AuthLayer {
    /// Creates a new auth layer.
    pub fn new(tokens: TokenService, cookies: CredentialCookies, users: Arc<dyn UserStore>) -> Self {
        Self {
            tokens,
            cookies,
            users,
            public_paths: Arc::new(HashSet::new()),
        }
    }

    /// Creates a layer from application state and its configured public paths.
    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.tokens.clone(), state.cookies.clone(), Arc::clone(&state.users))
            .with_public_paths(state.config.server.public_paths.clone())
    }

    /// Adds public paths that don't require authentication.
    ///
    /// A trailing `*` matches any suffix.
    pub fn with_public_paths(mut self, paths: Vec<String>) -> Self {
        self.public_paths = Arc::new(paths.into_iter().collect());
        self
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            layer: self.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for cookie authentication.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    layer: AuthLayer,
}

impl<S> AuthMiddleware<S> {
    fn is_public_path(&self, path: &str) -> bool {
        let public_paths = &self.layer.public_paths;
        if public_paths.contains(path) {
            return true;
        }

        public_paths
            .iter()
            .filter_map(|p| p.strip_suffix('*'))
            .any(|prefix| path.starts_with(prefix))
    }
}

async fn authenticate(layer: &AuthLayer, headers: &HeaderMap) -> ApiResult<AuthContext> {
    let jar = SignedCookieJar::from_headers(headers, layer.cookies.key().clone());
    let token = layer
        .cookies
        .read(&jar, TokenPurpose::AccessToken)
        .ok_or_else(|| ApiError::unauthorized("No access token provided"))?;

    let user_id = layer.tokens.validate(TokenPurpose::AccessToken, &token)?;
    let user: User = layer
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unknown subject"))?;

    Ok(AuthContext::new(Arc::new(user)))
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let layer = self.layer.clone();
        let is_public = self.is_public_path(req.uri().path());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if is_public {
                return inner.call(req).await;
            }

            match authenticate(&layer, req.headers()).await {
                Ok(auth_ctx) => {
                    tracing::debug!(
                        user_id = %auth_ctx.user_id(),
                        request_id = %auth_ctx.request_id,
                        "Request authenticated"
                    );
                    req.extensions_mut().insert(auth_ctx);
                    inner.call(req).await
                }
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;
    use crate::users::InMemoryUserStore;
    use axum::http::{StatusCode, header};
    use std::convert::Infallible;
    use tower::ServiceExt;

    async fn echo_user(req: Request<Body>) -> Result<Response, Infallible> {
        let body = req
            .extensions()
            .get::<AuthContext>()
            .map(|ctx| ctx.user_id().to_string())
            .unwrap_or_default();
        Ok(Response::new(Body::from(body)))
    }

    async fn setup() -> (AppState, User) {
        let store = Arc::new(InMemoryUserStore::new());
        let user = store
            .insert(User::new("ada@example.com", "Ada", "h"))
            .await
            .unwrap();
        let state = AppState::builder()
            .config(test_config())
            .user_store(store)
            .build()
            .unwrap();
        (state, user)
    }

    fn cookie_header(state: &AppState, token: &str) -> String {
        let jar = SignedCookieJar::new(state.cookies.key().clone());
        let response = state
            .cookies
            .set(jar, TokenPurpose::AccessToken, token)
            .into_response();
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_valid_cookie_attaches_context() {
        let (state, user) = setup().await;
        let token = state.tokens.issue(TokenPurpose::AccessToken, &user.id).unwrap();

        let service = AuthLayer::from_state(&state).layer(tower::service_fn(echo_user));
        let req = Request::builder()
            .uri("/users/me")
            .header(header::COOKIE, cookie_header(&state, &token.token))
            .body(Body::empty())
            .unwrap();

        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, user.id.as_bytes());
    }

    #[tokio::test]
    async fn test_missing_cookie_is_unauthorized() {
        let (state, _) = setup().await;
        let service = AuthLayer::from_state(&state).layer(tower::service_fn(echo_user));

        let req = Request::builder().uri("/users/me").body(Body::empty()).unwrap();
        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_token_in_access_cookie_is_unauthorized() {
        let (state, user) = setup().await;
        let token = state.tokens.issue(TokenPurpose::RefreshToken, &user.id).unwrap();
        let service = AuthLayer::from_state(&state).layer(tower::service_fn(echo_user));

        let req = Request::builder()
            .uri("/users/me")
            .header(header::COOKIE, cookie_header(&state, &token.token))
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_subject_is_unauthorized() {
        let (state, _) = setup().await;
        let token = state.tokens.issue(TokenPurpose::AccessToken, "ghost").unwrap();
        let service = AuthLayer::from_state(&state).layer(tower::service_fn(echo_user));

        let req = Request::builder()
            .uri("/users/me")
            .header(header::COOKIE, cookie_header(&state, &token.token))
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_paths() {
        let (state, _) = setup().await;
        let layer = AuthLayer::from_state(&state)
            .with_public_paths(vec!["/health".to_string(), "/docs/*".to_string()]);
        let middleware = layer.layer(tower::service_fn(echo_user));

        assert!(middleware.is_public_path("/health"));
        assert!(middleware.is_public_path("/docs/index.html"));
        assert!(!middleware.is_public_path("/users/me"));

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = middleware.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
