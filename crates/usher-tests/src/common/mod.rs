// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Common Test Utilities
//!
//! - `fixtures`: configurations and credentials
//! - `mocks`: store implementations with failure injection
//! - `harness`: drives the full router in-process and tracks cookies

pub mod fixtures;
pub mod harness;
pub mod mocks;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize test logging once per test binary.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("warn,usher_api=debug")),
            )
            .with_test_writer()
            .try_init();
    });
}
