// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Logging and tracing initialization.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{LogFormat, is_known_level};
use crate::error::{BinError, BinResult};

/// Noisy dependencies are capped regardless of the requested level.
const DEPENDENCY_DIRECTIVES: &str = "hyper=warn,tower=warn,tower_http=info,axum=info";

/// Builds the filter. `RUST_LOG` wins over `level` when set.
pub fn build_filter(level: &str) -> BinResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = if is_known_level(level) { level } else { "info" };
    EnvFilter::try_new(format!("{},{}", level, DEPENDENCY_DIRECTIVES))
        .map_err(|e| BinError::init(format!("Invalid log filter: {}", e)))
}

/// Initializes the global subscriber.
pub fn init_logging(level: &str, format: LogFormat) -> BinResult<()> {
    let filter = build_filter(level)?;
    let registry = tracing_subscriber::registry().with(filter);
    let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());

    let result = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_ansi(is_terminal))
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_ansi(is_terminal),
            )
            .try_init(),
    };

    result.map_err(|e| BinError::init(format!("Failed to initialize logging: {}", e)))
}
