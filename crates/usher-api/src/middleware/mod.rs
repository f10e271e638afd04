// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! - [`AuthLayer`]: signed-cookie authentication
//! - [`AuthorizeLayer`]: route permission policies

mod auth;
mod authorize;

pub use auth::{AuthLayer, AuthMiddleware};
pub use authorize::{AuthorizeLayer, AuthorizeMiddleware};
