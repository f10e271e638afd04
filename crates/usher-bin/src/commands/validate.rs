// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use usher_api::AppState;
use usher_config::{UsherConfig, load_config};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Loads the configuration and builds application state from it.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    if !config_path.exists() {
        return Err(BinError::config(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let config = load_config(config_path)
        .map_err(|e| BinError::from(e).with_context("Configuration validation failed"))?;

    // Cookie key and permission map are only checked when state is built.
    let state = AppState::builder()
        .config(config.clone())
        .build()
        .map_err(|e| BinError::from(e).with_context("Configuration validation failed"))?;
    let permission_count = state.permissions().get_all_permissions().len();

    let warnings = collect_warnings(&config);

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Listen:       {}", config.server.socket_addr());
            println!("  Issuer:       {}", config.auth.issuer);
            println!("  Algorithm:    {:?}", config.auth.algorithm);
            for (field, credential) in config.auth.credentials() {
                println!(
                    "  {:<18} cookie '{}', {}s",
                    field, credential.cookie_name, credential.duration_secs
                );
            }
            println!("  Permissions:  {}", permission_count);
            println!("  Admin emails: {}", config.permissions.admin_emails.len());

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration (secrets omitted):");
                println!(
                    "{}",
                    serde_json::to_string_pretty(&config)
                        .map_err(|e| BinError::runtime(e.to_string()))?
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "listen": config.server.socket_addr().to_string(),
                    "issuer": config.auth.issuer,
                    "audience": config.auth.audience,
                    "permission_count": permission_count,
                    "admin_email_count": config.permissions.admin_emails.len(),
                },
                "warnings": warnings,
                "config": if args.show_config { Some(&config) } else { None },
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&output).map_err(|e| BinError::runtime(e.to_string()))?
            );
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

/// Non-fatal findings worth reporting.
pub fn collect_warnings(config: &UsherConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    for (field, credential) in config.auth.credentials() {
        if !credential.secure {
            warnings.push(format!(
                "{}: cookie '{}' is sent over plain HTTP",
                field, credential.cookie_name
            ));
        }
    }

    let secrets = [
        config.auth.access.secret.expose(),
        config.auth.refresh.secret.expose(),
        config.auth.confirmation.secret.expose(),
    ];
    if secrets[0] == secrets[1] || secrets[1] == secrets[2] || secrets[0] == secrets[2] {
        warnings.push("Credential kinds share a signing secret".to_string());
    }

    if config.auth.access.duration_secs >= config.auth.refresh.duration_secs {
        warnings.push("Access tokens outlive refresh tokens".to_string());
    }

    if config.permissions.admin_emails.is_empty() {
        warnings.push("No admin emails configured; nobody can grant permissions".to_string());
    }

    for path in ["/auth/login", "/auth/refresh"] {
        if !config.server.public_paths.iter().any(|p| p == path) {
            warnings.push(format!("{} is not a public path", path));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use usher_config::SecretValue;

    fn config() -> UsherConfig {
        let mut config = UsherConfig::default();
        config.auth.cookie_secret = SecretValue::new("k".repeat(64));
        config.auth.access = config.auth.access.with_secret("a".repeat(32));
        config.auth.refresh = config.auth.refresh.with_secret("r".repeat(32));
        config.auth.confirmation = config.auth.confirmation.with_secret("p".repeat(32));
        config.permissions.admin_emails = vec!["root@example.com".to_string()];
        config
    }

    #[test]
    fn test_clean_config_has_no_warnings() {
        assert!(collect_warnings(&config()).is_empty());
    }

    #[test]
    fn test_warnings() {
        let mut config = config();
        config.auth.refresh.secret = SecretValue::new("a".repeat(32));
        config.auth.access.secure = false;
        config.permissions.admin_emails.clear();

        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("access_token"));
    }
}
