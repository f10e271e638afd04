// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use usher_api::users::{InMemoryUserStore, ProfileChanges, User, UserStore};
use usher_api::{ApiError, ApiResult};

/// User store that counts lookups and can be made to fail.
#[derive(Default)]
pub struct FlakyUserStore {
    inner: InMemoryUserStore,
    failing: AtomicBool,
    lookups: AtomicUsize,
}

impl FlakyUserStore {
    /// Creates a healthy store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `find_by_id` calls so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check(&self) -> ApiResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(ApiError::internal("user store unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserStore for FlakyUserStore {
    async fn find_by_id(&self, id: &str) -> ApiResult<Option<User>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        self.check()?;
        self.inner.find_by_email(email).await
    }

    async fn insert(&self, user: User) -> ApiResult<User> {
        self.check()?;
        self.inner.insert(user).await
    }

    async fn update_profile(&self, id: &str, changes: ProfileChanges) -> ApiResult<User> {
        self.check()?;
        self.inner.update_profile(id, changes).await
    }

    async fn set_password_hash(&self, id: &str, password_hash: String) -> ApiResult<User> {
        self.check()?;
        self.inner.set_password_hash(id, password_hash).await
    }

    async fn set_permissions(&self, id: &str, permissions: Vec<String>) -> ApiResult<User> {
        self.check()?;
        self.inner.set_permissions(id, permissions).await
    }
}
