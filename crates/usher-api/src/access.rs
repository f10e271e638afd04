// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application permission map and route policies.
//!
//! ```text
//! user
//! ├── read
//! │   ├── own           id == caller (or no id bound)
//! │   └── others        id != caller
//! ├── update
//! │   ├── own
//! │   └── others
//! └── permissions
//!     └── update        id != caller
//! permissions
//! └── list
//! ```

use crate::auth::{Arguments, PermissionNode, Requirement, RoutePolicy};
use crate::users::User;

/// Request parameter carrying the target user id.
pub const USER_ID_PARAM: &str = "userId";

/// Permissions every newly registered user receives, as path segments.
pub const DEFAULT_GRANTS: [&[&str]; 2] = [&["user", "read", "own"], &["user", "update", "own"]];

fn targets_self(subject: &User, args: &Arguments) -> bool {
    args.get("id").is_none_or(|id| *id == subject.id)
}

fn targets_other(subject: &User, args: &Arguments) -> bool {
    args.get("id").is_some_and(|id| *id != subject.id)
}

fn own_or_others() -> PermissionNode<User> {
    PermissionNode::branch()
        .with("own", PermissionNode::decide(targets_self))
        .with("others", PermissionNode::decide(targets_other))
}

/// Builds the permission map served by the application.
pub fn default_permission_map() -> PermissionNode<User> {
    PermissionNode::branch()
        .with(
            "user",
            PermissionNode::branch()
                .with("read", own_or_others())
                .with("update", own_or_others())
                .with(
                    "permissions",
                    // nobody edits their own grants
                    PermissionNode::branch().with("update", PermissionNode::decide(targets_other)),
                ),
        )
        .with(
            "permissions",
            PermissionNode::branch().with("list", PermissionNode::allow()),
        )
}

// =============================================================================
// AccessPolicies
// =============================================================================

/// Permission strings and route policies, joined with the configured
/// separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicies {
    separator: String,
}

impl AccessPolicies {
    /// Creates the policies for `separator`.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Joins path segments into a permission string.
    pub fn permission(&self, segments: &[&str]) -> String {
        segments.join(&self.separator)
    }

    /// Grants for a newly registered user.
    pub fn default_grants(&self) -> Vec<String> {
        DEFAULT_GRANTS
            .iter()
            .map(|segments| self.permission(segments))
            .collect()
    }

    fn own_or_others_of(&self, action: &str) -> Requirement {
        Requirement::any([
            Requirement::permission(self.permission(&["user", action, "own"])),
            Requirement::permission(self.permission(&["user", action, "others"])),
        ])
        .bind("id", USER_ID_PARAM)
    }

    /// `GET /users/{userId}`
    pub fn read_user(&self) -> RoutePolicy {
        RoutePolicy::requires(self.own_or_others_of("read"))
    }

    /// `PATCH /users/{userId}`
    pub fn update_user(&self) -> RoutePolicy {
        RoutePolicy::requires(self.own_or_others_of("update"))
    }

    /// `PATCH /users/me`
    pub fn update_self(&self) -> RoutePolicy {
        RoutePolicy::requires(Requirement::permission(
            self.permission(&["user", "update", "own"]),
        ))
    }

    /// `PUT /users/{userId}/permissions`
    pub fn update_permissions(&self) -> RoutePolicy {
        RoutePolicy::requires(
            Requirement::permission(self.permission(&["user", "permissions", "update"]))
                .bind("id", USER_ID_PARAM),
        )
    }

    /// `GET /permissions`
    pub fn list_permissions(&self) -> RoutePolicy {
        RoutePolicy::requires(Requirement::permission(
            self.permission(&["permissions", "list"]),
        ))
    }

    /// Every policy the router installs.
    pub fn route_policies(&self) -> Vec<RoutePolicy> {
        vec![
            self.read_user(),
            self.update_user(),
            self.update_self(),
            self.update_permissions(),
            self.list_permissions(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Authorizer, PermissionContainer, RequestParams};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn authorizer(separator: &str) -> Authorizer<User> {
        Authorizer::new(Arc::new(
            PermissionContainer::new(default_permission_map(), separator).unwrap(),
        ))
    }

    fn params(user_id: &str) -> RequestParams {
        RequestParams::from([(USER_ID_PARAM.to_string(), user_id.to_string())])
    }

    #[test]
    fn test_permission_universe() {
        let container = PermissionContainer::new(default_permission_map(), ":").unwrap();
        assert_eq!(
            container.get_all_permissions(),
            vec![
                "user:read:own",
                "user:read:others",
                "user:update:own",
                "user:update:others",
                "user:permissions:update",
                "permissions:list",
            ]
        );
        assert!(container
            .validate_grants(&AccessPolicies::new(":").default_grants())
            .is_ok());
    }

    #[tokio::test]
    async fn test_read_own_but_not_others() {
        let authorizer = authorizer(":");
        let policies = AccessPolicies::new(":");
        let user = Arc::new(User::new("a@example.com", "A", "h"));
        let granted: HashSet<String> = policies.default_grants().into_iter().collect();
        let requirement = policies.read_user().handler.unwrap();

        assert!(authorizer
            .is_allowed(&requirement, &user, &granted, &params(&user.id))
            .await
            .unwrap());
        assert!(!authorizer
            .is_allowed(&requirement, &user, &granted, &params("someone-else"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_cannot_edit_own_grants() {
        let authorizer = authorizer(":");
        let user = Arc::new(User::new("a@example.com", "A", "h"));
        let granted: HashSet<String> = ["user:permissions:update".to_string()].into();
        let requirement = AccessPolicies::new(":").update_permissions().handler.unwrap();

        assert!(!authorizer
            .is_allowed(&requirement, &user, &granted, &params(&user.id))
            .await
            .unwrap());
        assert!(authorizer
            .is_allowed(&requirement, &user, &granted, &params("other"))
            .await
            .unwrap());
    }

    #[test]
    fn test_policies_follow_separator() {
        for separator in [":", ".", "/", "::"] {
            let container =
                PermissionContainer::new(default_permission_map(), separator).unwrap();
            let policies = AccessPolicies::new(separator);

            for policy in policies.route_policies() {
                for requirement in policy.requirements() {
                    for name in requirement.permission_names() {
                        assert!(
                            container.get_callback(name).is_ok(),
                            "{} does not resolve with '{}'",
                            name,
                            separator
                        );
                    }
                }
            }
            assert!(container.validate_grants(&policies.default_grants()).is_ok());
        }
    }

    #[tokio::test]
    async fn test_dotted_map_reads_own_profile() {
        let authorizer = authorizer(".");
        let policies = AccessPolicies::new(".");
        let user = Arc::new(User::new("a@example.com", "A", "h"));
        let granted: HashSet<String> = policies.default_grants().into_iter().collect();
        assert!(granted.contains("user.read.own"));

        let requirement = policies.read_user().handler.unwrap();
        assert!(authorizer
            .is_allowed(&requirement, &user, &granted, &params(&user.id))
            .await
            .unwrap());
    }
}
