// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server runtime orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use usher_api::{ApiServer, AppState};
use usher_config::{UsherConfig, load_config};

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// UsherRuntime
// =============================================================================

/// Owns the configuration and runs the API server until shutdown.
pub struct UsherRuntime {
    config: Arc<UsherConfig>,
    shutdown: ShutdownCoordinator,
}

impl UsherRuntime {
    /// Creates a new runtime.
    pub fn new(config: UsherConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &UsherConfig {
        &self.config
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Builds application state from the configuration.
    pub fn build_state(&self) -> BinResult<AppState> {
        AppState::builder()
            .config(self.config.as_ref().clone())
            .build()
            .map_err(|e| BinError::from(e).with_context("Failed to initialize application state"))
    }

    /// Runs the server until an OS signal or `initiate_shutdown`.
    pub async fn run(self) -> BinResult<()> {
        info!(version = usher_api::VERSION, "Starting Usher");

        let state = self.build_state()?;
        let server = ApiServer::new(state);
        info!(addr = %server.addr(), "Usher is ready");

        let signals = self.shutdown.clone();
        let signal_task = tokio::spawn(async move { signals.wait_for_os_signal().await });

        let result = server
            .run_with_shutdown(self.shutdown.shutdown_signal())
            .await;
        signal_task.abort();

        info!("Usher shutdown complete");
        result.map_err(BinError::from)
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<UsherConfig>,
    port: Option<u16>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: UsherConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the listen port.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<UsherRuntime> {
        let mut config = match self.config {
            Some(config) => config,
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("No configuration provided"))?;
                load_config(&path).map_err(|e| {
                    BinError::from(e).with_context(format!("Failed to load {}", path.display()))
                })?
            }
        };

        if let Some(port) = self.port {
            config.server.port = port;
            config.validate()?;
        }

        Ok(UsherRuntime::new(config))
    }
}
