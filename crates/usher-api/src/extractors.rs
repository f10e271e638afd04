// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::auth::AuthContext;
use crate::error::ApiError;

// =============================================================================
// Auth Extractor
// =============================================================================

/// Extractor for authenticated requests.
///
/// Reads the [`AuthContext`] placed in request extensions by the auth
/// middleware. Returns 401 if absent.
///
/// ```rust,ignore
/// async fn handler(Auth(ctx): Auth) -> impl IntoResponse {
///     format!("Hello, {}", ctx.user.name)
/// }
/// ```
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Extractor for optionally authenticated requests.
pub struct OptionalAuth(pub Option<AuthContext>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<AuthContext>().cloned()))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// JSON body extractor that rejects with the API error format.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(
        req: axum::http::Request<axum::body::Body>,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        Ok(ValidatedJson(value))
    }
}

// =============================================================================
// User ID Extractor
// =============================================================================

/// Extractor for the `{userId}` path segment.
pub struct UserIdPath(pub String);

impl<S> FromRequestParts<S> for UserIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(user_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid user id: {}", e)))?;

        if user_id.is_empty() {
            return Err(ApiError::bad_request("User id cannot be empty"));
        }
        Ok(UserIdPath(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::User;
    use axum::http::Request;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_auth_extractor() {
        let (mut parts, _) = Request::new(()).into_parts();
        assert!(Auth::from_request_parts(&mut parts, &()).await.is_err());

        let OptionalAuth(none) = OptionalAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(none.is_none());

        let user = Arc::new(User::new("ada@example.com", "Ada", "h"));
        parts.extensions.insert(AuthContext::new(Arc::clone(&user)));
        let Auth(ctx) = Auth::from_request_parts(&mut parts, &()).await.ok().unwrap();
        assert_eq!(ctx.user_id(), user.id);
    }

    #[tokio::test]
    async fn test_validated_json_rejects_garbage() {
        let req = Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let result = ValidatedJson::<serde_json::Value>::from_request(req, &()).await;
        assert!(matches!(result, Err(ApiError::BadRequest { .. })));
    }
}
