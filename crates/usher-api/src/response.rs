// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::TokenPair;
use crate::users::User;

// =============================================================================
// ApiResponse
// =============================================================================

/// Generic success wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Always `true` for this type; failures use the error body.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Current server time.
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    /// Creates a healthy response.
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id.
    pub id: String,
    /// Email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Granted permissions.
    pub permissions: Vec<String>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            permissions: user.permissions.clone(),
            created_at: user.created_at,
        }
    }
}

/// Returned on login and refresh. Tokens travel only in cookies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// The signed-in user.
    pub user: UserProfile,
    /// Access token expiry, milliseconds since the epoch.
    pub access_expires_at: i64,
    /// Refresh token expiry, milliseconds since the epoch.
    pub refresh_expires_at: i64,
}

impl SessionResponse {
    /// Builds the response from a user and the issued pair.
    pub fn new(user: &User, pair: &TokenPair) -> Self {
        Self {
            user: UserProfile::from(user),
            access_expires_at: pair.access.expires_at,
            refresh_expires_at: pair.refresh.expires_at,
        }
    }
}

/// Returned when a password confirmation is issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationResponse {
    /// Confirmation expiry, milliseconds since the epoch.
    pub expires_at: i64,
}

/// The flattened permission universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsResponse {
    /// Every valid permission string, in map order.
    pub permissions: Vec<String>,
}
