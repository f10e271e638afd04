// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handler.

use axum::{Json, response::IntoResponse};

use crate::response::HealthResponse;

/// GET /health
///
/// Liveness check. Returns 200 OK while the service is running.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::healthy())
}
