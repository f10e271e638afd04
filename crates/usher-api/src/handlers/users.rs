// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User profile and administration handlers.

use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;

use crate::auth::TokenPurpose;
use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extractors::{Auth, UserIdPath, ValidatedJson};
use crate::response::{ApiResponse, UserProfile};
use crate::state::AppState;
use crate::users::{MIN_PASSWORD_LENGTH, ProfileChanges, User, hash_password};

// =============================================================================
// Profile
// =============================================================================

/// Profile update body. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    /// New email.
    pub email: Option<String>,
    /// New display name.
    pub name: Option<String>,
}

impl UpdateProfileRequest {
    fn into_changes(self) -> ApiResult<ProfileChanges> {
        let mut errors = ValidationErrors::new();
        let mut changes = ProfileChanges::default();
        if let Some(email) = self.email {
            if email.contains('@') {
                changes.email = Some(email.trim().to_string());
            } else {
                errors.add("email", "must be an email address");
            }
        }
        if let Some(name) = self.name {
            if name.trim().is_empty() {
                errors.add("name", "cannot be empty");
            } else {
                changes.name = Some(name.trim().to_string());
            }
        }
        errors.into_result(changes)
    }
}

async fn load_user(state: &AppState, user_id: &str) -> ApiResult<User> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {}", user_id)))
}

/// GET /users/me
pub async fn get_me(Auth(ctx): Auth) -> impl IntoResponse {
    Json(ApiResponse::success(UserProfile::from(ctx.user.as_ref())))
}

/// PATCH /users/me
pub async fn update_me(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let changes = request.into_changes()?;
    let user = state.users.update_profile(ctx.user_id(), changes).await?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(ApiResponse::success(UserProfile::from(&user))))
}

/// GET /users/{userId}
pub async fn get_user(
    State(state): State<AppState>,
    UserIdPath(user_id): UserIdPath,
) -> ApiResult<impl IntoResponse> {
    let user = load_user(&state, &user_id).await?;
    Ok(Json(ApiResponse::success(UserProfile::from(&user))))
}

/// PATCH /users/{userId}
pub async fn update_user(
    State(state): State<AppState>,
    UserIdPath(user_id): UserIdPath,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let changes = request.into_changes()?;
    let user = state.users.update_profile(&user_id, changes).await?;

    tracing::info!(user_id = %user.id, "Profile updated by administrator");
    Ok(Json(ApiResponse::success(UserProfile::from(&user))))
}

// =============================================================================
// Password
// =============================================================================

/// Password change body.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// The new password.
    pub new_password: String,
}

/// PUT /users/me/password
///
/// Requires a valid password-confirmation cookie for the caller. The
/// confirmation cookie is cleared afterwards.
pub async fn change_password(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    jar: SignedCookieJar,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let payload = state.cookies.read(&jar, TokenPurpose::PasswordConfirmation);
    let confirmed = state
        .confirmation
        .check(Some(ctx.user.as_ref()), payload.as_deref())
        .await?;
    if !confirmed {
        return Err(ApiError::unauthorized("Password confirmation failed"));
    }

    if request.new_password.len() < MIN_PASSWORD_LENGTH {
        let mut errors = ValidationErrors::new();
        errors.add(
            "new_password",
            format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
        );
        return Err(ApiError::validation_with_errors("Validation failed", errors));
    }

    let password_hash = hash_password(&request.new_password)?;
    state.users.set_password_hash(ctx.user_id(), password_hash).await?;

    let jar = state.cookies.clear(jar, TokenPurpose::PasswordConfirmation);
    tracing::info!(user_id = %ctx.user_id(), "Password changed");

    Ok((
        jar,
        Json(serde_json::json!({
            "success": true,
            "message": "Password changed"
        })),
    ))
}

// =============================================================================
// Permissions
// =============================================================================

/// Grant replacement body.
#[derive(Debug, Deserialize)]
pub struct UpdatePermissionsRequest {
    /// The complete new set of granted permissions.
    pub permissions: Vec<String>,
}

/// PUT /users/{userId}/permissions
///
/// Replaces a user's grants after checking each against the permission map.
pub async fn update_permissions(
    State(state): State<AppState>,
    UserIdPath(user_id): UserIdPath,
    ValidatedJson(request): ValidatedJson<UpdatePermissionsRequest>,
) -> ApiResult<impl IntoResponse> {
    state.permissions().validate_grants(&request.permissions)?;

    let mut seen = std::collections::HashSet::new();
    let permissions = request
        .permissions
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect();
    let user = state.users.set_permissions(&user_id, permissions).await?;

    tracing::info!(
        user_id = %user.id,
        permissions = ?user.permissions,
        "Permissions updated"
    );
    Ok(Json(ApiResponse::success(UserProfile::from(&user))))
}
