// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Route policy enforcement middleware.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::{FromRequestParts, Query, RawPathParams},
    http::{Request, request::Parts},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{PermissionGuard, RequestParams, RoutePolicy};
use crate::error::{ApiError, ApiResult};
use crate::users::User;

// =============================================================================
// AuthorizeLayer
// =============================================================================

/// Layer enforcing a [`RoutePolicy`].
///
/// Apply with `route_layer` (or on a method router) so path parameters are
/// available. Parameters come from the query string and the path, with path
/// parameters taking precedence.
#[derive(Clone)]
pub struct AuthorizeLayer {
    guard: PermissionGuard<User>,
    policy: Arc<RoutePolicy>,
}

impl AuthorizeLayer {
    /// Creates a layer for a policy.
    pub fn new(guard: PermissionGuard<User>, policy: RoutePolicy) -> Self {
        Self {
            guard,
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for AuthorizeLayer {
    type Service = AuthorizeMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthorizeMiddleware {
            inner,
            guard: self.guard.clone(),
            policy: Arc::clone(&self.policy),
        }
    }
}

// =============================================================================
// AuthorizeMiddleware
// =============================================================================

/// Middleware for route policy enforcement.
#[derive(Clone)]
pub struct AuthorizeMiddleware<S> {
    inner: S,
    guard: PermissionGuard<User>,
    policy: Arc<RoutePolicy>,
}

async fn request_params(parts: &mut Parts) -> ApiResult<RequestParams> {
    let mut params: RequestParams = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(query)| query)
        .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e)))?;

    if let Ok(path) = RawPathParams::from_request_parts(parts, &()).await {
        for (key, value) in &path {
            params.insert(key.to_string(), value.to_string());
        }
    }

    Ok(params)
}

impl<S> Service<Request<Body>> for AuthorizeMiddleware<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let guard = self.guard.clone();
        let policy = Arc::clone(&self.policy);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if policy.is_open() {
                return inner.call(req).await;
            }

            let (mut parts, body) = req.into_parts();
            let decision = match request_params(&mut parts).await {
                Ok(params) => guard.can_activate(&policy, &parts, &params).await,
                Err(e) => Err(e),
            };

            match decision {
                Ok(true) => inner.call(Request::from_parts(parts, body)).await,
                Ok(false) => {
                    tracing::warn!(
                        path = %parts.uri.path(),
                        policy = ?policy,
                        "Permission denied"
                    );
                    Ok(ApiError::forbidden("Insufficient permissions").into_response())
                }
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
