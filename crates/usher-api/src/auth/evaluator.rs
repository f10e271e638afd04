// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Requirement evaluation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};

use super::permissions::{Arguments, PermissionContainer};
use super::requirement::Requirement;
use crate::error::{ApiError, ApiResult};

/// Request parameters available for binding, from path and query.
pub type RequestParams = HashMap<String, String>;

/// Evaluates requirements against a subject's granted permissions.
pub struct Authorizer<S> {
    container: Arc<PermissionContainer<S>>,
}

impl<S> Clone for Authorizer<S> {
    fn clone(&self) -> Self {
        Self {
            container: Arc::clone(&self.container),
        }
    }
}

impl<S: Send + Sync + 'static> Authorizer<S> {
    /// Creates an authorizer over a permission container.
    pub fn new(container: Arc<PermissionContainer<S>>) -> Self {
        Self { container }
    }

    /// Returns the underlying container.
    pub fn container(&self) -> &Arc<PermissionContainer<S>> {
        &self.container
    }

    /// Decides whether `subject` satisfies `requirement`.
    ///
    /// All children of an `and`/`or` node run concurrently and to completion;
    /// the first error in declaration order is returned after they finish. A
    /// permission outside `granted` is `false` without its callback running.
    pub fn is_allowed<'a>(
        &'a self,
        requirement: &'a Requirement,
        subject: &'a Arc<S>,
        granted: &'a HashSet<String>,
        params: &'a RequestParams,
    ) -> BoxFuture<'a, ApiResult<bool>> {
        async move {
            match requirement {
                Requirement::All(children) => {
                    let results = join_all(
                        children
                            .iter()
                            .map(|child| self.is_allowed(child, subject, granted, params)),
                    )
                    .await;
                    let mut allowed = true;
                    for result in results {
                        allowed &= result?;
                    }
                    Ok(allowed)
                }
                Requirement::Any(children) => {
                    let results = join_all(
                        children
                            .iter()
                            .map(|child| self.is_allowed(child, subject, granted, params)),
                    )
                    .await;
                    let mut allowed = false;
                    for result in results {
                        allowed |= result?;
                    }
                    Ok(allowed)
                }
                Requirement::Permission { name, bindings } => {
                    if !granted.contains(name) {
                        tracing::trace!(permission = %name, "Permission not granted");
                        return Ok(false);
                    }

                    let mut args = Arguments::with_capacity(bindings.len());
                    for (arg, param) in bindings {
                        let value = params.get(param).ok_or_else(|| {
                            ApiError::not_found(format!("Request parameter '{}'", param))
                        })?;
                        args.insert(arg.clone(), value.clone());
                    }

                    let decide = self.container.get_callback(name)?;
                    let allowed = decide(Arc::clone(subject), args).await?;
                    tracing::trace!(permission = %name, allowed = allowed, "Permission decided");
                    Ok(allowed)
                }
            }
        }
        .boxed()
    }
}

// =============================================================================
// Tests
// =============================================================================
