// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;
use uuid::Uuid;

use super::guard::{IdentityResolver, PermissionProvider};
use crate::error::{ApiError, ApiResult};
use crate::users::User;

/// An authenticated subject with a stable id.
pub trait Principal: Send + Sync + 'static {
    /// Returns the subject id carried in tokens.
    fn principal_id(&self) -> &str;
}

impl Principal for User {
    fn principal_id(&self) -> &str {
        &self.id
    }
}

/// Authentication context for a request.
///
/// Attached to request extensions by the auth middleware after the access
/// token validated and the user was found.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The authenticated user.
    pub user: Arc<User>,
    /// Request ID for tracing.
    pub request_id: Uuid,
}

impl AuthContext {
    /// Creates a context for a resolved user.
    pub fn new(user: Arc<User>) -> Self {
        Self {
            user,
            request_id: Uuid::now_v7(),
        }
    }

    /// Returns the user id.
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

/// Resolves the caller from the [`AuthContext`] in request extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextIdentityResolver;

#[async_trait]
impl IdentityResolver<User> for ContextIdentityResolver {
    async fn retrieve_from(&self, parts: &Parts) -> ApiResult<Arc<User>> {
        parts
            .extensions
            .get::<AuthContext>()
            .map(|ctx| Arc::clone(&ctx.user))
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Reads granted permissions straight off the user record.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserPermissionProvider;

#[async_trait]
impl PermissionProvider<User> for UserPermissionProvider {
    async fn permissions_for(&self, subject: &User) -> ApiResult<Vec<String>> {
        Ok(subject.permissions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_resolver_reads_extension() {
        let user = Arc::new(User::new("ada@example.com", "Ada", "hash"));
        let (mut parts, _) = Request::new(()).into_parts();

        let err = ContextIdentityResolver.retrieve_from(&parts).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));

        parts.extensions.insert(AuthContext::new(Arc::clone(&user)));
        let resolved = ContextIdentityResolver.retrieve_from(&parts).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_provider_returns_user_grants() {
        let user = User::new("ada@example.com", "Ada", "hash")
            .with_permissions(vec!["user:read:own".to_string()]);
        let granted = UserPermissionProvider.permissions_for(&user).await.unwrap();
        assert_eq!(granted, vec!["user:read:own".to_string()]);
    }
}
