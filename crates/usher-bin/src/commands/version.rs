// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;

/// Prints version information.
pub fn version(_cli: &Cli) -> BinResult<()> {
    println!("Usher - cookie authentication and permission service");
    println!();
    println!("Version Information:");
    println!("  usher-bin:    {}", env!("CARGO_PKG_VERSION"));
    println!("  usher-api:    {}", usher_api::VERSION);
    println!("  usher-config: {}", usher_config::VERSION);
    println!();
    println!("Build Information:");
    println!("  Rust Edition: 2024");
    println!("  Target:       {}", std::env::consts::ARCH);
    println!("  OS:           {}", std::env::consts::OS);
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
