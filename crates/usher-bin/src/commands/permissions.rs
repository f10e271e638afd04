// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `permissions` command.

use usher_api::access::default_permission_map;
use usher_api::auth::PermissionContainer;
use usher_api::users::User;
use usher_config::load_config;

use crate::cli::{Cli, OutputFormat, PermissionsArgs};
use crate::error::{BinError, BinResult};

/// Lists the permission universe, or checks `--check` grants against it.
///
/// The separator comes from the config file when one exists.
pub fn permissions(cli: &Cli, args: PermissionsArgs) -> BinResult<()> {
    let separator = if cli.config.exists() {
        load_config(&cli.config)?.permissions.separator
    } else {
        tracing::debug!(path = %cli.config.display(), "No config file, using default separator");
        usher_config::PermissionSettings::default().separator
    };

    let container = PermissionContainer::<User>::new(default_permission_map(), separator)?;

    if !args.check.is_empty() {
        return match container.validate_grants(&args.check) {
            Ok(()) => {
                println!("✓ {} grant(s) valid", args.check.len());
                Ok(())
            }
            Err(e) => Err(BinError::from(e).with_context("Grant check failed")),
        };
    }

    let all = container.get_all_permissions();
    match args.format {
        OutputFormat::Text => all.iter().for_each(|p| println!("{}", p)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&all).map_err(|e| BinError::runtime(e.to_string()))?
        ),
    }
    Ok(())
}
