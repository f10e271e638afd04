// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission map and container.
//!
//! The map is a tree of string keys whose leaves are decision callbacks. A
//! permission string is a root-to-leaf path joined with the configured
//! separator, e.g. `user:update:own`. Key order is insertion order, so
//! flattening the tree is deterministic.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::error::{ApiError, ApiResult, ValidationErrors};

/// Arguments handed to a decision callback, keyed by callback argument name.
pub type Arguments = IndexMap<String, String>;

/// A decision callback.
pub type Decision<S> =
    Arc<dyn Fn(Arc<S>, Arguments) -> BoxFuture<'static, ApiResult<bool>> + Send + Sync>;

// =============================================================================
// PermissionNode
// =============================================================================

/// A node in the permission map: a decision callback or a branch of named
/// children.
pub struct PermissionNode<S> {
    kind: NodeKind<S>,
}

enum NodeKind<S> {
    Leaf(Decision<S>),
    Branch(IndexMap<String, PermissionNode<S>>),
    /// A leaf that was given children. Rejected by [`PermissionContainer::new`].
    Overgrown(Vec<String>),
}

impl<S> PermissionNode<S> {
    fn leaf(decision: Decision<S>) -> Self {
        Self {
            kind: NodeKind::Leaf(decision),
        }
    }
}

impl<S: Send + Sync + 'static> PermissionNode<S> {
    /// Creates a leaf from an async callback.
    pub fn decide_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<S>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<bool>> + Send + 'static,
    {
        Self::leaf(Arc::new(move |subject: Arc<S>, args: Arguments| {
            f(subject, args).boxed()
        }))
    }

    /// Creates a leaf from a synchronous predicate.
    pub fn decide<F>(f: F) -> Self
    where
        F: Fn(&S, &Arguments) -> bool + Send + Sync + 'static,
    {
        Self::leaf(Arc::new(move |subject: Arc<S>, args: Arguments| {
            let allowed = f(subject.as_ref(), &args);
            futures::future::ready(Ok(allowed)).boxed()
        }))
    }

    /// A leaf that always allows.
    pub fn allow() -> Self {
        Self::decide(|_, _| true)
    }

    /// Creates an empty branch.
    pub fn branch() -> Self {
        Self {
            kind: NodeKind::Branch(IndexMap::new()),
        }
    }

    /// Adds a child to a branch, replacing any child with the same key.
    ///
    /// A leaf cannot have children; doing so makes the map invalid and
    /// [`PermissionContainer::new`] reports it.
    pub fn with(mut self, key: impl Into<String>, child: PermissionNode<S>) -> Self {
        let key = key.into();
        self.kind = match self.kind {
            NodeKind::Branch(mut children) => {
                children.insert(key, child);
                NodeKind::Branch(children)
            }
            NodeKind::Leaf(_) => NodeKind::Overgrown(vec![key]),
            NodeKind::Overgrown(mut keys) => {
                keys.push(key);
                NodeKind::Overgrown(keys)
            }
        };
        self
    }
}

impl<S> fmt::Debug for PermissionNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Leaf(_) => f.write_str("Leaf"),
            NodeKind::Branch(children) => f.debug_map().entries(children.iter()).finish(),
            NodeKind::Overgrown(keys) => f.debug_tuple("Overgrown").field(keys).finish(),
        }
    }
}

// =============================================================================
// PermissionContainer
// =============================================================================

/// Holds the static permission map and resolves permission strings.
pub struct PermissionContainer<S> {
    root: IndexMap<String, PermissionNode<S>>,
    separator: String,
}

impl<S> PermissionContainer<S> {
    /// Creates a container.
    ///
    /// `root` must be a branch. Keys may not be empty or contain the
    /// separator, and leaves may not have children.
    pub fn new(root: PermissionNode<S>, separator: impl Into<String>) -> ApiResult<Self> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(ApiError::configuration("Permission separator cannot be empty"));
        }

        let NodeKind::Branch(root) = root.kind else {
            return Err(ApiError::configuration("Permission map root must be a branch"));
        };

        check_level(&root, &separator, None)?;
        Ok(Self { root, separator })
    }

    /// Returns the separator.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Resolves a permission string to its decision callback.
    pub fn get_callback(&self, permission: &str) -> ApiResult<Decision<S>> {
        let mut level = &self.root;
        let mut segments = permission.split(self.separator.as_str()).peekable();

        while let Some(segment) = segments.next() {
            let last = segments.peek().is_none();
            match level.get(segment).map(|node| &node.kind) {
                Some(NodeKind::Leaf(decision)) if last => return Ok(Arc::clone(decision)),
                Some(NodeKind::Branch(_)) if last => {
                    return Err(ApiError::configuration(format!(
                        "Permission '{}' is not a decision callback",
                        permission
                    )));
                }
                Some(NodeKind::Branch(children)) => level = children,
                Some(NodeKind::Leaf(_) | NodeKind::Overgrown(_)) | None => break,
            }
        }

        Err(ApiError::configuration(format!(
            "Permission '{}' does not exist",
            permission
        )))
    }

    /// Flattens the map into every valid permission string, depth-first.
    pub fn get_all_permissions(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect(&self.root, None, &mut out);
        out
    }

    fn collect(
        &self,
        level: &IndexMap<String, PermissionNode<S>>,
        prefix: Option<&str>,
        out: &mut Vec<String>,
    ) {
        for (key, node) in level {
            let path = join_path(prefix, &self.separator, key);
            match &node.kind {
                NodeKind::Leaf(_) => out.push(path),
                NodeKind::Branch(children) => self.collect(children, Some(&path), out),
                NodeKind::Overgrown(_) => {}
            }
        }
    }

    /// Rejects grant strings that name no known permission.
    pub fn validate_grants(&self, grants: &[String]) -> ApiResult<()> {
        let known: HashSet<String> = self.get_all_permissions().into_iter().collect();

        let mut errors = ValidationErrors::new();
        for (index, grant) in grants.iter().enumerate() {
            if !known.contains(grant) {
                errors.add(
                    format!("permissions[{}]", index),
                    format!("'{}' is not a known permission", grant),
                );
            }
        }
        errors.into_result(())
    }
}

impl<S> fmt::Debug for PermissionContainer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionContainer")
            .field("separator", &self.separator)
            .field("root", &self.root)
            .finish()
    }
}

fn join_path(prefix: Option<&str>, separator: &str, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}{}{}", prefix, separator, key),
        None => key.to_string(),
    }
}

fn check_level<S>(
    level: &IndexMap<String, PermissionNode<S>>,
    separator: &str,
    prefix: Option<&str>,
) -> ApiResult<()> {
    for (key, node) in level {
        if key.is_empty() || key.contains(separator) {
            return Err(ApiError::configuration(match prefix {
                Some(prefix) => format!("Invalid permission key '{}' under '{}'", key, prefix),
                None => format!("Invalid permission key '{}' at the root", key),
            }));
        }
        let path = join_path(prefix, separator, key);
        match &node.kind {
            NodeKind::Leaf(_) => {}
            NodeKind::Branch(children) => check_level(children, separator, Some(&path))?,
            NodeKind::Overgrown(keys) => {
                return Err(ApiError::configuration(format!(
                    "Permission '{}' is a decision callback and cannot have children ({})",
                    path,
                    keys.join(", ")
                )));
            }
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
