// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User storage.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::User;
use crate::error::{ApiError, ApiResult};

/// Entity lookup and persistence for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by id.
    async fn find_by_id(&self, id: &str) -> ApiResult<Option<User>>;

    /// Finds a user by email, ignoring case.
    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>>;

    /// Inserts a new user. Fails with `Conflict` if the email is taken.
    async fn insert(&self, user: User) -> ApiResult<User>;

    /// Applies profile changes to the stored record.
    ///
    /// Fails with `NotFound` if absent and `Conflict` if the new email is taken.
    async fn update_profile(&self, id: &str, changes: ProfileChanges) -> ApiResult<User>;

    /// Replaces the password hash only.
    async fn set_password_hash(&self, id: &str, password_hash: String) -> ApiResult<User>;

    /// Replaces the granted permissions only.
    async fn set_permissions(&self, id: &str, permissions: Vec<String>) -> ApiResult<User>;
}

/// Profile fields to overwrite. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    /// New login email.
    pub email: Option<String>,
    /// New display name.
    pub name: Option<String>,
}

/// In-memory store backed by `DashMap`.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, User>,
    emails: DashMap<String, String>,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if no users are stored.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn missing(id: &str) -> ApiError {
    ApiError::not_found(format!("User {}", id))
}

impl InMemoryUserStore {
    /// Edits the stored record in place, under the entry lock.
    fn modify(&self, id: &str, edit: impl FnOnce(&mut User)) -> ApiResult<User> {
        let mut entry = self.users.get_mut(id).ok_or_else(|| missing(id))?;
        edit(entry.value_mut());
        Ok(entry.value().clone())
    }

    fn move_email(&self, id: &str, email: &str) -> ApiResult<()> {
        let previous = self
            .users
            .get(id)
            .map(|r| r.value().email.clone())
            .ok_or_else(|| missing(id))?;

        let (old_key, new_key) = (email_key(&previous), email_key(email));
        if old_key == new_key {
            return Ok(());
        }
        match self.emails.entry(new_key) {
            Entry::Occupied(_) => return Err(ApiError::conflict("Email is already registered")),
            Entry::Vacant(slot) => {
                slot.insert(id.to_string());
            }
        }
        self.emails.remove(&old_key);
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: &str) -> ApiResult<Option<User>> {
        Ok(self.users.get(id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let Some(id) = self.emails.get(&email_key(email)).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        self.find_by_id(&id).await
    }

    async fn insert(&self, user: User) -> ApiResult<User> {
        match self.emails.entry(email_key(&user.email)) {
            Entry::Occupied(_) => {
                return Err(ApiError::conflict("Email is already registered"));
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }
        self.users.insert(user.id.clone(), user.clone());

        tracing::debug!(user_id = %user.id, "User inserted");
        Ok(user)
    }

    async fn update_profile(&self, id: &str, changes: ProfileChanges) -> ApiResult<User> {
        let ProfileChanges { email, name } = changes;
        if let Some(email) = &email {
            self.move_email(id, email)?;
        }
        self.modify(id, |user| {
            if let Some(email) = email {
                user.email = email;
            }
            if let Some(name) = name {
                user.name = name;
            }
        })
    }

    async fn set_password_hash(&self, id: &str, password_hash: String) -> ApiResult<User> {
        self.modify(id, |user| user.password_hash = password_hash)
    }

    async fn set_permissions(&self, id: &str, permissions: Vec<String>) -> ApiResult<User> {
        self.modify(id, |user| user.permissions = permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryUserStore::new();
        let user = store
            .insert(User::new("Ada@Example.com", "Ada", "h"))
            .await
            .unwrap();

        assert_eq!(store.find_by_id(&user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(
            store.find_by_email("ada@example.com").await.unwrap().map(|u| u.id),
            Some(user.id)
        );
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = InMemoryUserStore::new();
        store.insert(User::new("ada@example.com", "Ada", "h")).await.unwrap();

        let err = store
            .insert(User::new("ADA@example.com", "Other", "h"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict { .. }));
        assert_eq!(store.len(), 1);
    }

    fn email_change(email: &str) -> ProfileChanges {
        ProfileChanges {
            email: Some(email.to_string()),
            name: None,
        }
    }

    #[tokio::test]
    async fn test_update_profile_moves_email_index() {
        let store = InMemoryUserStore::new();
        let user = store.insert(User::new("old@example.com", "Ada", "h")).await.unwrap();
        store.insert(User::new("taken@example.com", "Bob", "h")).await.unwrap();

        let err = store
            .update_profile(&user.id, email_change("taken@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict { .. }));

        store
            .update_profile(&user.id, email_change("new@example.com"))
            .await
            .unwrap();
        assert!(store.find_by_email("old@example.com").await.unwrap().is_none());
        assert_eq!(
            store.find_by_email("new@example.com").await.unwrap().map(|u| u.id),
            Some(user.id)
        );
    }

    #[tokio::test]
    async fn test_field_writes_leave_other_fields_alone() {
        let store = InMemoryUserStore::new();
        let user = store
            .insert(User::new("ada@example.com", "Ada", "h1").with_permissions(vec!["a".into()]))
            .await
            .unwrap();

        store.set_permissions(&user.id, Vec::new()).await.unwrap();
        store.set_password_hash(&user.id, "h2".to_string()).await.unwrap();
        let updated = store
            .update_profile(
                &user.id,
                ProfileChanges {
                    email: None,
                    name: Some("Ada L".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ada L");
        assert_eq!(updated.password_hash, "h2");
        assert!(updated.permissions.is_empty());
        assert_eq!(updated.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let store = InMemoryUserStore::new();
        let err = store.set_permissions("missing", Vec::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
        let err = store
            .update_profile("missing", email_change("x@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }
}
