// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header},
    routing::{get, patch, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use usher_config::{ServerConfig, UsherConfig};

use crate::auth::RoutePolicy;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AuthLayer, AuthorizeLayer};
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
pub struct ApiServer {
    state: AppState,
    config: Arc<UsherConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = Arc::clone(&state.config);
        Self { state, config }
    }

    fn authorize(&self, policy: RoutePolicy) -> AuthorizeLayer {
        AuthorizeLayer::new(self.state.guard.clone(), policy)
    }

    /// Creates the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let server = &self.config.server;
        let access = &self.state.access;

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                server.request_timeout(),
            ))
            .option_layer(create_cors_layer(server))
            .layer(AuthLayer::from_state(&self.state));

        Router::new()
            .route("/health", get(handlers::health))
            // Credential lifecycle
            .route("/auth/register", post(handlers::register))
            .route("/auth/login", post(handlers::login))
            .route("/auth/refresh", post(handlers::refresh))
            .route("/auth/logout", post(handlers::logout))
            .route("/auth/confirm-password", post(handlers::confirm_password))
            // Own profile
            .route(
                "/users/me",
                get(handlers::get_me).merge(
                    patch(handlers::update_me).route_layer(self.authorize(access.update_self())),
                ),
            )
            .route("/users/me/password", put(handlers::change_password))
            // Other users
            .route(
                "/users/{userId}",
                get(handlers::get_user)
                    .route_layer(self.authorize(access.read_user()))
                    .merge(
                        patch(handlers::update_user)
                            .route_layer(self.authorize(access.update_user())),
                    ),
            )
            .route(
                "/users/{userId}/permissions",
                put(handlers::update_permissions)
                    .route_layer(self.authorize(access.update_permissions())),
            )
            .route(
                "/permissions",
                get(handlers::list_permissions)
                    .route_layer(self.authorize(access.list_permissions())),
            )
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Runs the server until `shutdown_signal` resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.addr();
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        info!(addr = %addr, "Starting API server");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");
        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.server.socket_addr()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Builds a credentialed CORS layer, or `None` when no origins are configured.
fn create_cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true),
    )
}

// =============================================================================
// Tests
// =============================================================================
