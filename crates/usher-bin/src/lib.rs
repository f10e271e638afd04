// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # usher-bin
//!
//! CLI binary for the Usher authentication service.
//!
//! ```text
//!              main.rs
//!                 │
//!              cli.rs
//!                 │
//!     ┌───────────┼───────────┐
//!     ▼           ▼           ▼
//! commands     runtime     logging
//!                 │
//!             shutdown
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! usher -c /etc/usher/usher.yaml
//!
//! # Validate configuration
//! usher validate
//!
//! # List the permission universe
//! usher permissions --format json
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{RuntimeBuilder, UsherRuntime};
pub use shutdown::ShutdownCoordinator;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
