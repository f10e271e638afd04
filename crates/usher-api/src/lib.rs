// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # usher-api
//!
//! HTTP surface for Usher: a dual-token cookie authentication lifecycle
//! with step-up password confirmation, and a permission engine that
//! evaluates composable route requirements against a tree of decision
//! callbacks.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod access;
pub mod auth;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod state;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ApiError, ApiResult};
pub use server::ApiServer;
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
