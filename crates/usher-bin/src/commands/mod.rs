// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.

mod permissions;
mod run;
mod validate;
mod version;

pub use permissions::permissions;
pub use run::run;
pub use validate::validate;
pub use version::version;

use crate::cli::{Cli, Commands};
use crate::error::BinResult;
use crate::logging::init_logging;

/// Executes the command selected on the command line.
///
/// `run` initializes logging after loading its configuration so the config
/// file's logging section applies. Other commands log per CLI flags only.
pub async fn execute(cli: Cli) -> BinResult<()> {
    let command = cli.effective_command();
    if !matches!(command, Commands::Run(_)) {
        init_logging(&cli.effective_log_level(None), cli.effective_log_format(None))?;
    }

    match command {
        Commands::Run(args) => run::run(&cli, args).await,
        Commands::Validate(args) => validate::validate(&cli, args),
        Commands::Permissions(args) => permissions::permissions(&cli, args),
        Commands::Version => version::version(&cli),
    }
}
