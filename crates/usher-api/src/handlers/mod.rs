// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`health`]: liveness
//! - `auth`: register, login, refresh, logout, password confirmation
//! - `users`: profile, password change, administration
//! - `permissions`: permission listing

mod auth;
mod health;
mod permissions;
mod users;

pub use auth::*;
pub use health::*;
pub use permissions::*;
pub use users::*;
