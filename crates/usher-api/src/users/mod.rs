// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User records and storage.

mod password;
mod store;

pub use password::{MIN_PASSWORD_LENGTH, hash_password, verify_password};
pub use store::{InMemoryUserStore, ProfileChanges, UserStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable id, used as the token subject.
    pub id: String,
    /// Login email, unique case-insensitively.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Argon2 PHC hash.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Granted permission strings.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a user with a fresh id and no permissions.
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            email: email.into(),
            name: name.into(),
            password_hash: password_hash.into(),
            permissions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Sets the granted permissions.
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Returns `true` if the permission is granted.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_not_serialized() {
        let user = User::new("ada@example.com", "Ada", "$argon2id$secret");
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }

    #[test]
    fn test_ids_are_unique() {
        let a = User::new("a@example.com", "A", "h");
        let b = User::new("b@example.com", "B", "h");
        assert_ne!(a.id, b.id);
    }
}
