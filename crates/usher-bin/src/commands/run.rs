// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use crate::cli::{Cli, RunArgs};
use crate::error::BinResult;
use crate::logging::init_logging;
use crate::runtime::RuntimeBuilder;

/// Loads configuration, initializes logging and serves until shutdown.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    let runtime = RuntimeBuilder::new()
        .config_path(&cli.config)
        .port(args.port)
        .build()?;

    let logging = &runtime.config().logging;
    init_logging(
        &cli.effective_log_level(Some(logging)),
        cli.effective_log_format(Some(logging)),
    )?;

    runtime.run().await
}
