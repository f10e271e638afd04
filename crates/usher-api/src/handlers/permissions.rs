// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission listing.

use axum::{Json, extract::State, response::IntoResponse};

use crate::response::{ApiResponse, PermissionsResponse};
use crate::state::AppState;

/// GET /permissions
///
/// Lists every grantable permission string.
pub async fn list_permissions(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(PermissionsResponse {
        permissions: state.permissions().get_all_permissions(),
    }))
}
