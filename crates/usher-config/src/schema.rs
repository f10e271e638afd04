// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for Usher.
//!
//! # Schema Structure
//!
//! ```text
//! UsherConfig
//! ├── server: ServerConfig
//! ├── auth: AuthConfig
//! │   ├── access: CredentialConfig
//! │   ├── refresh: CredentialConfig
//! │   └── confirmation: CredentialConfig
//! ├── permissions: PermissionSettings
//! └── logging: LoggingConfig
//! ```

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Minimum length of a token signing secret in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Minimum length of the cookie signing key in bytes.
pub const MIN_COOKIE_KEY_LENGTH: usize = 64;

/// Default access token lifetime (15 minutes).
pub const DEFAULT_ACCESS_DURATION_SECS: i64 = 15 * 60;

/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_DURATION_SECS: i64 = 7 * 24 * 60 * 60;

/// Default password confirmation lifetime (5 minutes).
pub const DEFAULT_CONFIRMATION_DURATION_SECS: i64 = 5 * 60;

/// Default permission path separator.
pub const DEFAULT_PERMISSION_SEPARATOR: &str = ":";

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration structure for Usher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsherConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Token and cookie configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Permission namespace settings.
    #[serde(default)]
    pub permissions: PermissionSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl UsherConfig {
    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.auth.validate()?;
        self.permissions.validate()?;
        Ok(())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    pub host: IpAddr,

    /// Listen port.
    pub port: u16,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Paths served without an access token. A trailing `*` matches a prefix.
    pub public_paths: Vec<String>,

    /// Browser origins allowed to send credentialed cross-origin requests.
    /// Empty disables CORS handling.
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::validation("server.port", "cannot be zero"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout_secs",
                "cannot be zero",
            ));
        }
        if self.cors_origins.iter().any(|o| o == "*") {
            return Err(ConfigError::validation(
                "server.cors_origins",
                "wildcard origin cannot be combined with credentialed cookies",
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: DEFAULT_PORT,
            request_timeout_secs: 30,
            public_paths: vec![
                "/health".to_string(),
                "/auth/register".to_string(),
                "/auth/login".to_string(),
                "/auth/refresh".to_string(),
                "/auth/logout".to_string(),
            ],
            cors_origins: Vec::new(),
        }
    }
}

// =============================================================================
// Auth Configuration
// =============================================================================

/// Signing algorithm for tokens. Only symmetric HMAC variants are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    #[default]
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
}

/// Token and cookie configuration shared by every credential kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Token issuer (`iss`).
    pub issuer: String,

    /// Token audience (`aud`).
    pub audience: String,

    /// Token signing algorithm.
    pub algorithm: SigningAlgorithm,

    /// Key used to sign cookies.
    #[serde(skip_serializing)]
    pub cookie_secret: SecretValue,

    /// Access token credential.
    pub access: CredentialConfig,

    /// Refresh token credential.
    pub refresh: CredentialConfig,

    /// Password confirmation credential.
    pub confirmation: CredentialConfig,
}

impl AuthConfig {
    /// Validates the auth section on its own.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.issuer.is_empty() {
            return Err(ConfigError::validation("auth.issuer", "cannot be empty"));
        }
        if self.audience.is_empty() {
            return Err(ConfigError::validation("auth.audience", "cannot be empty"));
        }
        if self.cookie_secret.len() < MIN_COOKIE_KEY_LENGTH {
            return Err(ConfigError::validation(
                "auth.cookie_secret",
                format!("must be at least {} bytes", MIN_COOKIE_KEY_LENGTH),
            ));
        }

        self.access.validate("auth.access")?;
        self.refresh.validate("auth.refresh")?;
        self.confirmation.validate("auth.confirmation")?;

        let mut names = HashSet::new();
        for (field, credential) in self.credentials() {
            if !names.insert(credential.cookie_name.as_str()) {
                return Err(ConfigError::validation(
                    format!("{}.cookie_name", field),
                    format!("'{}' is used by another credential", credential.cookie_name),
                ));
            }
        }

        Ok(())
    }

    /// Returns every credential with its configuration path.
    pub fn credentials(&self) -> [(&'static str, &CredentialConfig); 3] {
        [
            ("auth.access", &self.access),
            ("auth.refresh", &self.refresh),
            ("auth.confirmation", &self.confirmation),
        ]
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "usher".to_string(),
            audience: "usher-clients".to_string(),
            algorithm: SigningAlgorithm::default(),
            cookie_secret: SecretValue::default(),
            access: CredentialConfig::new("access_token", DEFAULT_ACCESS_DURATION_SECS),
            refresh: CredentialConfig::new("refresh_token", DEFAULT_REFRESH_DURATION_SECS),
            confirmation: CredentialConfig::new(
                "password_confirmation",
                DEFAULT_CONFIRMATION_DURATION_SECS,
            ),
        }
    }
}

/// Configuration for a single credential kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialConfig {
    /// Token signing secret.
    #[serde(default, skip_serializing)]
    pub secret: SecretValue,

    /// Token and cookie lifetime in seconds.
    pub duration_secs: i64,

    /// Cookie carrying the token.
    pub cookie_name: String,

    /// Whether the cookie is restricted to secure transport.
    #[serde(default = "default_secure")]
    pub secure: bool,
}

fn default_secure() -> bool {
    true
}

impl CredentialConfig {
    /// Creates a credential without a secret.
    pub fn new(cookie_name: impl Into<String>, duration_secs: i64) -> Self {
        Self {
            secret: SecretValue::default(),
            duration_secs,
            cookie_name: cookie_name.into(),
            secure: true,
        }
    }

    /// Sets the signing secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = SecretValue::new(secret);
        self
    }

    /// Returns the lifetime as a Duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs.max(0) as u64)
    }

    fn validate(&self, field: &str) -> ConfigResult<()> {
        if self.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::validation(
                format!("{}.secret", field),
                format!("must be at least {} bytes", MIN_SECRET_LENGTH),
            ));
        }
        if self.duration_secs <= 0 {
            return Err(ConfigError::validation(
                format!("{}.duration_secs", field),
                "must be positive",
            ));
        }
        if self.cookie_name.is_empty() {
            return Err(ConfigError::validation(
                format!("{}.cookie_name", field),
                "cannot be empty",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Permission Settings
// =============================================================================

/// Permission namespace settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionSettings {
    /// Separator joining permission path segments.
    pub separator: String,

    /// Emails granted every known permission when they register.
    pub admin_emails: Vec<String>,
}

impl PermissionSettings {
    /// Returns `true` if `email` is listed as an administrator, ignoring case.
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email.trim()))
    }
}

impl PermissionSettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.separator.is_empty() {
            return Err(ConfigError::validation(
                "permissions.separator",
                "cannot be empty",
            ));
        }
        Ok(())
    }
}

impl Default for PermissionSettings {
    fn default() -> Self {
        Self {
            separator: DEFAULT_PERMISSION_SEPARATOR.to_string(),
            admin_emails: Vec::new(),
        }
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    pub level: LogLevel,

    /// Log format.
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parses a level, accepting `warning` as an alias.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON lines.
    Json,
    /// Compact single-line text.
    Compact,
}

// =============================================================================
// Secret Value
// =============================================================================

/// A secret string that never appears in `Debug` or `Display` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Creates a new secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no secret is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "SecretValue(<unset>)")
        } else {
            write!(f, "SecretValue(***)")
        }
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "***")
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> UsherConfig {
        let mut config = UsherConfig::default();
        config.auth.cookie_secret = SecretValue::new("c".repeat(64));
        config.auth.access.secret = SecretValue::new("a".repeat(32));
        config.auth.refresh.secret = SecretValue::new("r".repeat(32));
        config.auth.confirmation.secret = SecretValue::new("p".repeat(32));
        config
    }

    #[test]
    fn test_default_config_requires_secrets() {
        let err = UsherConfig::default().validate().unwrap_err();
        assert_eq!(err.field(), Some("auth.cookie_secret"));
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = valid_config();
        config.auth.refresh.secret = SecretValue::new("too-short");
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("auth.refresh.secret"));
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let mut config = valid_config();
        config.auth.confirmation.duration_secs = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("auth.confirmation.duration_secs"));
    }

    #[test]
    fn test_duplicate_cookie_names_rejected() {
        let mut config = valid_config();
        config.auth.refresh.cookie_name = config.auth.access.cookie_name.clone();
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("auth.refresh.cookie_name"));
    }

    #[test]
    fn test_admin_email_match_ignores_case() {
        let settings = PermissionSettings {
            admin_emails: vec!["Root@Example.com".to_string()],
            ..Default::default()
        };
        assert!(settings.is_admin_email("root@example.com"));
        assert!(!settings.is_admin_email("user@example.com"));
    }

    #[test]
    fn test_empty_separator_rejected() {
        let mut config = valid_config();
        config.permissions.separator = String::new();
        let err = config.validate().unwrap_err();
        assert_eq!(err.field(), Some("permissions.separator"));
    }

    #[test]
    fn test_secret_value_is_redacted() {
        let secret = SecretValue::new("super-secret");
        assert_eq!(format!("{:?}", secret), "SecretValue(***)");
        assert_eq!(secret.to_string(), "***");
        assert_eq!(secret.expose(), "super-secret");
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let json = serde_json::to_string(&valid_config()).unwrap();
        assert!(!json.contains("aaaaaaaa"));
        assert!(!json.contains("cookie_secret"));
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("verbose"), None);
    }
}
