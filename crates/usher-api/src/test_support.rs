// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared fixtures for unit tests.

use usher_config::{AuthConfig, SecretValue};

/// Auth configuration with valid, distinct secrets.
pub fn test_auth_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.cookie_secret = SecretValue::new("k".repeat(64));
    config.access = config.access.with_secret("a".repeat(32));
    config.refresh = config.refresh.with_secret("r".repeat(32));
    config.confirmation = config.confirmation.with_secret("p".repeat(32));
    config
}

/// Full configuration with valid secrets.
pub fn test_config() -> usher_config::UsherConfig {
    usher_config::UsherConfig {
        auth: test_auth_config(),
        ..Default::default()
    }
}
