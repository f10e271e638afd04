// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use usher_config::UsherConfig;

use crate::access::{AccessPolicies, default_permission_map};
use crate::auth::{
    Authorizer, ConfirmationGuard, ContextIdentityResolver, CredentialCookies,
    PermissionContainer, PermissionGuard, PermissionNode, TokenConfirmationValidator,
    TokenService, UserPermissionProvider,
};
use crate::error::{ApiError, ApiResult};
use crate::users::{InMemoryUserStore, User, UserStore};

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// Everything here is built once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<UsherConfig>,
    /// Token issuance and validation.
    pub tokens: TokenService,
    /// Cookie transport for credentials.
    pub cookies: CredentialCookies,
    /// User storage.
    pub users: Arc<dyn UserStore>,
    /// Route permission guard.
    pub guard: PermissionGuard<User>,
    /// Step-up confirmation guard.
    pub confirmation: ConfirmationGuard<User>,
    /// Route policies and default grants for the configured separator.
    pub access: AccessPolicies,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the permission container.
    pub fn permissions(&self) -> &Arc<PermissionContainer<User>> {
        self.guard.authorizer().container()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<UsherConfig>,
    users: Option<Arc<dyn UserStore>>,
    permission_map: Option<PermissionNode<User>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: UsherConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the user store. Defaults to an in-memory store.
    pub fn user_store(mut self, store: Arc<dyn UserStore>) -> Self {
        self.users = Some(store);
        self
    }

    /// Replaces the application permission map.
    pub fn permission_map(mut self, map: PermissionNode<User>) -> Self {
        self.permission_map = Some(map);
        self
    }

    /// Builds the AppState, validating the configuration.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self
            .config
            .ok_or_else(|| ApiError::configuration("AppState requires a configuration"))?;
        config.validate()?;

        let tokens = TokenService::new(&config.auth)?;
        let cookies = CredentialCookies::new(&config.auth)?;

        let map = self.permission_map.unwrap_or_else(default_permission_map);
        let container = Arc::new(PermissionContainer::new(map, config.permissions.separator.clone())?);
        let access = AccessPolicies::new(container.separator());
        check_route_policies(&container, &access)?;
        tracing::debug!(
            permissions = container.get_all_permissions().len(),
            separator = %container.separator(),
            "Permission map loaded"
        );

        let guard = PermissionGuard::new(
            Authorizer::new(container),
            Arc::new(ContextIdentityResolver),
            Arc::new(UserPermissionProvider),
        );
        let confirmation =
            ConfirmationGuard::new(Arc::new(TokenConfirmationValidator::new(tokens.clone())));

        let users = self
            .users
            .unwrap_or_else(|| Arc::new(InMemoryUserStore::new()));

        Ok(AppState {
            config: Arc::new(config),
            tokens,
            cookies,
            users,
            guard,
            confirmation,
            access,
        })
    }
}

/// Every permission a route names must resolve to a decision callback.
fn check_route_policies(
    container: &PermissionContainer<User>,
    access: &AccessPolicies,
) -> ApiResult<()> {
    for policy in access.route_policies() {
        for requirement in policy.requirements() {
            for name in requirement.permission_names() {
                container.get_callback(name)?;
            }
        }
    }
    Ok(())
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookies.key().clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;

    #[test]
    fn test_build_with_defaults() {
        let state = AppState::builder().config(test_config()).build().unwrap();
        assert!(state
            .permissions()
            .get_all_permissions()
            .contains(&"permissions:list".to_string()));
    }

    #[test]
    fn test_build_requires_config() {
        assert!(matches!(
            AppState::builder().build(),
            Err(ApiError::Configuration { .. })
        ));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = test_config();
        config.auth.refresh.duration_secs = 0;
        assert!(AppState::builder().config(config).build().is_err());
    }

    #[test]
    fn test_custom_separator() {
        let mut config = test_config();
        config.permissions.separator = ".".to_string();
        let state = AppState::builder().config(config).build().unwrap();
        assert!(state
            .permissions()
            .get_all_permissions()
            .contains(&"user.read.own".to_string()));
        assert_eq!(
            state.access.default_grants(),
            vec!["user.read.own", "user.update.own"]
        );
    }

    #[test]
    fn test_map_missing_a_route_permission_fails_at_startup() {
        let map = PermissionNode::branch().with(
            "user",
            PermissionNode::branch().with(
                "read",
                PermissionNode::branch()
                    .with("own", PermissionNode::allow())
                    .with("others", PermissionNode::allow()),
            ),
        );
        let err = AppState::builder()
            .config(test_config())
            .permission_map(map)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::Configuration { .. }));
        assert!(err.to_string().contains("user:update:own"));
    }
}
