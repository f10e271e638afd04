// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading for Usher.
//!
//! # Loading Pipeline
//!
//! 1. Read the file and resolve `${VAR}` / `${VAR:default}` placeholders
//! 2. Parse YAML, TOML or JSON into [`UsherConfig`]
//! 3. Apply `USHER_*` environment overrides
//! 4. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! USHER_SERVER_PORT=9090
//! USHER_LOG_LEVEL=debug
//! USHER_COOKIE_SECRET=...
//! USHER_ACCESS_TOKEN_SECRET=...
//! USHER_REFRESH_TOKEN_SECRET=...
//! USHER_CONFIRMATION_TOKEN_SECRET=...
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{LogLevel, SecretValue, UsherConfig};
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader for Usher.
///
/// # Examples
///
/// ```no_run
/// use usher_config::loader::ConfigLoader;
///
/// let config = ConfigLoader::new().load("usher.yaml").unwrap();
/// println!("listening on {}", config.server.socket_addr());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix.
    env_prefix: String,

    /// Whether to resolve environment variables.
    resolve_env_vars: bool,
}

impl ConfigLoader {
    /// Creates a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            env_prefix: "USHER".to_string(),
            resolve_env_vars: true,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Loads configuration from a file.
    ///
    /// The format is chosen by extension: `.yaml`/`.yml`, `.toml` or `.json`.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<UsherConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;

        let format = ConfigFormat::from_path(path)?;
        let content = if self.resolve_env_vars {
            resolve_env_placeholders(&content)
        } else {
            content
        };

        let mut config: UsherConfig = parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })?;

        self.finish(&mut config)?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<UsherConfig> {
        let content = if self.resolve_env_vars {
            resolve_env_placeholders(content)
        } else {
            content.to_string()
        };
        let mut config: UsherConfig = parse_str(&content, format)?;
        self.finish(&mut config)?;
        Ok(config)
    }

    fn finish(&self, config: &mut UsherConfig) -> ConfigResult<()> {
        if self.resolve_env_vars {
            self.apply_env_overrides(config)?;
        }
        config.validate()?;
        debug!(
            issuer = %config.auth.issuer,
            separator = %config.permissions.separator,
            "Configuration validated"
        );
        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&self, config: &mut UsherConfig) -> ConfigResult<()> {
        let var = |suffix: &str| env::var(format!("{}_{}", self.env_prefix, suffix));

        if let Ok(value) = var("SERVER_PORT") {
            config.server.port = value.parse().map_err(|_| {
                ConfigError::invalid_env_var(
                    format!("{}_SERVER_PORT", self.env_prefix),
                    "expected valid port number",
                )
            })?;
        }

        if let Ok(value) = var("LOG_LEVEL") {
            match LogLevel::parse(&value) {
                Some(level) => config.logging.level = level,
                None => warn!(value = %value, "Ignoring unknown log level override"),
            }
        }

        if let Ok(value) = var("COOKIE_SECRET") {
            config.auth.cookie_secret = SecretValue::new(value);
        }
        if let Ok(value) = var("ACCESS_TOKEN_SECRET") {
            config.auth.access.secret = SecretValue::new(value);
        }
        if let Ok(value) = var("REFRESH_TOKEN_SECRET") {
            config.auth.refresh.secret = SecretValue::new(value);
        }
        if let Ok(value) = var("CONFIRMATION_TOKEN_SECRET") {
            config.auth.confirmation.secret = SecretValue::new(value);
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_str<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> ConfigResult<T> {
    match format {
        ConfigFormat::Yaml => {
            let source = config::Config::builder()
                .add_source(config::File::from_str(content, config::FileFormat::Yaml))
                .build()
                .map_err(|e| ConfigError::serialization(e.to_string()))?;
            source
                .try_deserialize()
                .map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

/// Resolves `${VAR_NAME}` and `${VAR_NAME:default}` placeholders.
///
/// Unknown variables without a default are left untouched.
fn resolve_env_placeholders(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };

        let body = &after[..end];
        let (name, default) = match body.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (body, None),
        };

        match (env::var(name), default) {
            (Ok(value), _) => result.push_str(&value),
            (Err(_), Some(default)) => result.push_str(default),
            (Err(_), None) => {
                warn!("Environment variable '{}' not found", name);
                result.push_str(&rest[start..start + 2 + end + 1]);
            }
        }

        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<UsherConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with the specified format.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<UsherConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================
