// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Route-level permission guard.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use super::evaluator::{Authorizer, RequestParams};
use super::requirement::Requirement;
use crate::error::ApiResult;

// =============================================================================
// Collaborator traits
// =============================================================================

/// Resolves the caller of a request.
#[async_trait]
pub trait IdentityResolver<S>: Send + Sync {
    /// Returns the subject, or `Unauthorized` if none is attached.
    async fn retrieve_from(&self, parts: &Parts) -> ApiResult<Arc<S>>;
}

/// Supplies the permissions granted to a subject.
#[async_trait]
pub trait PermissionProvider<S>: Send + Sync {
    /// Returns the granted permission strings.
    async fn permissions_for(&self, subject: &S) -> ApiResult<Vec<String>>;
}

// =============================================================================
// RoutePolicy
// =============================================================================

/// Requirements declared for a route, at scope level and handler level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePolicy {
    /// Requirement shared by every route in a scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Requirement>,
    /// Requirement of the individual handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<Requirement>,
}

impl RoutePolicy {
    /// A policy with no requirements.
    pub fn open() -> Self {
        Self::default()
    }

    /// A policy with only a handler requirement.
    pub fn requires(requirement: impl Into<Requirement>) -> Self {
        Self {
            scope: None,
            handler: Some(requirement.into()),
        }
    }

    /// Sets the scope requirement.
    pub fn with_scope(mut self, requirement: impl Into<Requirement>) -> Self {
        self.scope = Some(requirement.into());
        self
    }

    /// Declared requirements, scope first.
    pub fn requirements(&self) -> Vec<&Requirement> {
        self.scope.iter().chain(self.handler.iter()).collect()
    }

    /// Returns `true` if nothing is declared.
    pub fn is_open(&self) -> bool {
        self.scope.is_none() && self.handler.is_none()
    }
}

// =============================================================================
// PermissionGuard
// =============================================================================

/// Decides whether a request may reach its handler.
pub struct PermissionGuard<S> {
    authorizer: Authorizer<S>,
    identity: Arc<dyn IdentityResolver<S>>,
    provider: Arc<dyn PermissionProvider<S>>,
}

impl<S> Clone for PermissionGuard<S> {
    fn clone(&self) -> Self {
        Self {
            authorizer: self.authorizer.clone(),
            identity: Arc::clone(&self.identity),
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<S: Send + Sync + 'static> PermissionGuard<S> {
    /// Creates a guard.
    pub fn new(
        authorizer: Authorizer<S>,
        identity: Arc<dyn IdentityResolver<S>>,
        provider: Arc<dyn PermissionProvider<S>>,
    ) -> Self {
        Self {
            authorizer,
            identity,
            provider,
        }
    }

    /// Returns the authorizer.
    pub fn authorizer(&self) -> &Authorizer<S> {
        &self.authorizer
    }

    /// Evaluates a route policy for a request.
    ///
    /// An open policy allows without resolving identity or permissions.
    /// Otherwise the caller and their grants are resolved once and every
    /// requirement is evaluated concurrently; access needs all of them.
    pub async fn can_activate(
        &self,
        policy: &RoutePolicy,
        parts: &Parts,
        params: &RequestParams,
    ) -> ApiResult<bool> {
        let requirements = policy.requirements();
        if requirements.is_empty() {
            return Ok(true);
        }

        let subject = self.identity.retrieve_from(parts).await?;
        let granted: HashSet<String> = self
            .provider
            .permissions_for(&subject)
            .await?
            .into_iter()
            .collect();

        let results = join_all(
            requirements
                .into_iter()
                .map(|r| self.authorizer.is_allowed(r, &subject, &granted, params)),
        )
        .await;

        let mut allowed = true;
        for result in results {
            allowed &= result?;
        }
        Ok(allowed)
    }
}

// =============================================================================
// Tests
// =============================================================================
