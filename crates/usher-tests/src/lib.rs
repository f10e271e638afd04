// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Usher Integration Tests
//!
//! ## Module Structure
//!
//! - [`common`]: shared fixtures, mocks and an in-process HTTP harness
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p usher-tests
//! cargo test -p usher-tests --test integration_auth
//! cargo test -p usher-tests --test integration_permissions
//! cargo test -p usher-tests --test integration_config
//! ```
//!
//! ## Test Categories
//!
//! - `integration_auth.rs`: register, login, refresh, logout and password
//!   confirmation over HTTP with cookies
//! - `integration_permissions.rs`: route policies, grants and the
//!   permission engine against the application map
//! - `integration_config.rs`: loading and validating configuration files

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use crate::common::mocks::*;
    pub use crate::common::init_test_logging;
}
