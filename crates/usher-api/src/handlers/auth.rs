// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;

use crate::auth::{TokenPair, TokenPurpose};
use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extractors::{Auth, ValidatedJson};
use crate::response::{ApiResponse, ConfirmationResponse, SessionResponse};
use crate::state::AppState;
use crate::users::{MIN_PASSWORD_LENGTH, User, hash_password, verify_password};

fn set_session(state: &AppState, jar: SignedCookieJar, pair: &TokenPair) -> SignedCookieJar {
    let jar = state
        .cookies
        .set(jar, TokenPurpose::AccessToken, pair.access.token.clone());
    state
        .cookies
        .set(jar, TokenPurpose::RefreshToken, pair.refresh.token.clone())
}

// =============================================================================
// Register
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Plaintext password.
    pub password: String,
}

impl RegisterRequest {
    fn validate(&self) -> ApiResult<()> {
        let mut errors = ValidationErrors::new();
        if !self.email.contains('@') {
            errors.add("email", "must be an email address");
        }
        if self.name.trim().is_empty() {
            errors.add("name", "cannot be empty");
        }
        if self.password.len() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LENGTH),
            );
        }
        errors.into_result(())
    }
}

/// POST /auth/register
///
/// Creates a user and signs them in.
pub async fn register(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    request.validate()?;

    let grants = if state.config.permissions.is_admin_email(&request.email) {
        state.permissions().get_all_permissions()
    } else {
        state.access.default_grants()
    };

    let user = User::new(
        request.email.trim(),
        request.name.trim(),
        hash_password(&request.password)?,
    )
    .with_permissions(grants);
    let user = state.users.insert(user).await?;

    let pair = state.tokens.issue_pair(&user.id)?;
    let jar = set_session(&state, jar, &pair);

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        jar,
        Json(ApiResponse::success(SessionResponse::new(&user, &pair))),
    ))
}

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// POST /auth/login
///
/// Verifies credentials and sets the access and refresh cookies.
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let user = state
        .users
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !verify_password(&request.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Password mismatch on login");
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let pair = state.tokens.issue_pair(&user.id)?;
    let jar = set_session(&state, jar, &pair);

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((jar, Json(ApiResponse::success(SessionResponse::new(&user, &pair)))))
}

// =============================================================================
// Refresh
// =============================================================================

/// POST /auth/refresh
///
/// Rotates the pair using the refresh cookie.
pub async fn refresh(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> ApiResult<impl IntoResponse> {
    let token = state
        .cookies
        .read(&jar, TokenPurpose::RefreshToken)
        .ok_or_else(|| ApiError::unauthorized("No refresh token provided"))?;
    let user_id = state.tokens.validate(TokenPurpose::RefreshToken, &token)?;

    let user = state
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unknown subject"))?;

    let pair = state.tokens.issue_pair(&user.id)?;
    let jar = set_session(&state, jar, &pair);

    tracing::debug!(user_id = %user.id, "Token pair rotated");

    Ok((jar, Json(ApiResponse::success(SessionResponse::new(&user, &pair)))))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /auth/logout
///
/// Clears every credential cookie. Tokens stay valid until they expire.
pub async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> impl IntoResponse {
    let jar = state.cookies.clear_all(jar);
    (
        jar,
        Json(serde_json::json!({
            "success": true,
            "message": "Logged out"
        })),
    )
}

// =============================================================================
// Confirm Password
// =============================================================================

/// Password confirmation request body.
#[derive(Debug, Deserialize)]
pub struct ConfirmPasswordRequest {
    /// Current password.
    pub password: String,
}

/// POST /auth/confirm-password
///
/// Re-checks the caller's password and sets the short-lived confirmation cookie.
pub async fn confirm_password(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    jar: SignedCookieJar,
    ValidatedJson(request): ValidatedJson<ConfirmPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    if !verify_password(&request.password, &ctx.user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid password"));
    }

    let issued = state
        .tokens
        .issue(TokenPurpose::PasswordConfirmation, ctx.user_id())?;
    let jar = state
        .cookies
        .set(jar, TokenPurpose::PasswordConfirmation, issued.token);

    tracing::info!(user_id = %ctx.user_id(), "Password confirmed");

    Ok((
        jar,
        Json(ApiResponse::success(ConfirmationResponse {
            expires_at: issued.expires_at,
        })),
    ))
}
