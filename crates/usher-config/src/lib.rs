// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # usher-config
//!
//! Configuration management for the Usher authentication backend.
//!
//! ## Quick Start
//!
//! ```no_run
//! use usher_config::loader::load_config;
//!
//! let config = load_config("usher.yaml").unwrap();
//! println!("Issuer: {}", config.auth.issuer);
//! ```
//!
//! ## Configuration Schema
//!
//! - `server` - bind address, port, request timeout, public paths
//! - `auth` - issuer, audience, algorithm, cookie key and one credential
//!   block per token purpose (access, refresh, confirmation)
//! - `permissions` - permission path separator
//! - `logging` - level and format
//!
//! Values in config files can reference environment variables:
//!
//! ```yaml
//! auth:
//!   cookie_secret: "${USHER_COOKIE_KEY}"
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, ConfigFormat, ConfigLoader};
pub use schema::{
    AuthConfig, CredentialConfig, LogFormat, LogLevel, LoggingConfig, PermissionSettings,
    SecretValue, ServerConfig, SigningAlgorithm, UsherConfig,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
