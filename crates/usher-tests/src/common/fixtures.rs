// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures

use usher_config::{SecretValue, UsherConfig};

/// Email treated as an administrator by [`ConfigFixtures::standard`].
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Password used by every fixture account.
pub const PASSWORD: &str = "correct horse battery";

/// Pre-built configurations.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Valid configuration with distinct secrets, plain-HTTP cookies and one
    /// admin email.
    pub fn standard() -> UsherConfig {
        let mut config = UsherConfig::default();
        config.auth.cookie_secret = SecretValue::new("c".repeat(64));
        config.auth.access = config.auth.access.with_secret("a".repeat(32));
        config.auth.refresh = config.auth.refresh.with_secret("r".repeat(32));
        config.auth.confirmation = config.auth.confirmation.with_secret("p".repeat(32));
        config.auth.access.secure = false;
        config.auth.refresh.secure = false;
        config.auth.confirmation.secure = false;
        config.permissions.admin_emails = vec![ADMIN_EMAIL.to_string()];
        config
    }

    /// [`Self::standard`] with a given access token lifetime.
    pub fn with_access_duration(secs: i64) -> UsherConfig {
        let mut config = Self::standard();
        config.auth.access.duration_secs = secs;
        config
    }

    /// [`Self::standard`] with a given permission separator.
    pub fn with_separator(separator: &str) -> UsherConfig {
        let mut config = Self::standard();
        config.permissions.separator = separator.to_string();
        config
    }

    /// YAML document equivalent to [`Self::standard`].
    pub fn standard_yaml() -> String {
        format!(
            r#"
server:
  port: 8088
auth:
  cookie_secret: "{cookie}"
  access:
    secret: "{access}"
    duration_secs: 900
    cookie_name: access_token
    secure: false
  refresh:
    secret: "{refresh}"
    duration_secs: 604800
    cookie_name: refresh_token
    secure: false
  confirmation:
    secret: "{confirm}"
    duration_secs: 300
    cookie_name: password_confirmation
    secure: false
permissions:
  separator: ":"
  admin_emails:
    - {admin}
logging:
  level: debug
  format: json
"#,
            cookie = "c".repeat(64),
            access = "a".repeat(32),
            refresh = "r".repeat(32),
            confirm = "p".repeat(32),
            admin = ADMIN_EMAIL,
        )
    }
}

/// Registration payloads.
pub struct UserFixtures;

impl UserFixtures {
    /// A registration body for `email`.
    pub fn registration(email: &str, name: &str) -> serde_json::Value {
        serde_json::json!({
            "email": email,
            "name": name,
            "password": PASSWORD,
        })
    }

    /// A login body for `email`.
    pub fn login(email: &str) -> serde_json::Value {
        serde_json::json!({
            "email": email,
            "password": PASSWORD,
        })
    }
}
