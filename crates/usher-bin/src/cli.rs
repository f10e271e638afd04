// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: start the server (default)
//! - `validate`: validate the configuration file
//! - `permissions`: list or check permission strings
//! - `version`: show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use usher_config::{LogLevel, LoggingConfig};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// Usher - cookie authentication and permission service
#[derive(Parser, Debug)]
#[command(
    name = "usher",
    author = "Sylvex <contact@sylvex.io>",
    version = usher_api::VERSION,
    about = "Cookie authentication and permission evaluation service",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "usher.yaml",
        env = "USHER_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, env = "USHER_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format. Overrides the config file.
    #[arg(long, env = "USHER_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the HTTP server
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Validate the configuration file without starting the server
    Validate(ValidateArgs),

    /// List the permission strings the server accepts
    Permissions(PermissionsArgs),

    /// Show version information
    Version,
}

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation (secrets redacted)
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `permissions` command.
#[derive(Args, Debug, Default, Clone)]
pub struct PermissionsArgs {
    /// Check these grants against the permission map instead of listing it
    #[arg(long, num_args = 1..)]
    pub check: Vec<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<usher_config::LogFormat> for LogFormat {
    fn from(format: usher_config::LogFormat) -> Self {
        match format {
            usher_config::LogFormat::Text => LogFormat::Text,
            usher_config::LogFormat::Json => LogFormat::Json,
            usher_config::LogFormat::Compact => LogFormat::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Resolves the log level: `-q`/`-v`, then `--log-level`, then the config file.
    pub fn effective_log_level(&self, config: Option<&LoggingConfig>) -> String {
        if self.quiet {
            "warn".to_string()
        } else if self.verbose {
            "debug".to_string()
        } else if let Some(level) = &self.log_level {
            level.clone()
        } else {
            config
                .map(|c| c.level)
                .unwrap_or_default()
                .as_str()
                .to_string()
        }
    }

    /// Resolves the log format: `--log-format`, then the config file.
    pub fn effective_log_format(&self, config: Option<&LoggingConfig>) -> LogFormat {
        self.log_format
            .or_else(|| config.map(|c| c.format.into()))
            .unwrap_or_default()
    }
}

/// Returns `true` if `level` names a known log level.
pub fn is_known_level(level: &str) -> bool {
    LogLevel::parse(level).is_some()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["usher"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Run(_)));
    }

    #[test]
    fn test_run_port_override() {
        let cli = Cli::parse_from(["usher", "run", "-p", "9000"]);
        match cli.command {
            Some(Commands::Run(args)) => assert_eq!(args.port, Some(9000)),
            other => panic!("Expected Run command, got {:?}", other),
        }
    }

    #[test]
    fn test_permissions_check() {
        let cli = Cli::parse_from(["usher", "permissions", "--check", "a:b", "c:d"]);
        match cli.command {
            Some(Commands::Permissions(args)) => assert_eq!(args.check, vec!["a:b", "c:d"]),
            other => panic!("Expected Permissions command, got {:?}", other),
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["usher", "-c", "/etc/usher/usher.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/usher/usher.yaml"));
    }

    #[test]
    fn test_log_level_precedence() {
        let config = LoggingConfig {
            level: LogLevel::Error,
            ..Default::default()
        };

        let cli = Cli::parse_from(["usher"]);
        assert_eq!(cli.effective_log_level(Some(&config)), "error");
        assert_eq!(cli.effective_log_level(None), "info");

        let cli = Cli::parse_from(["usher", "-l", "trace"]);
        assert_eq!(cli.effective_log_level(Some(&config)), "trace");

        let cli = Cli::parse_from(["usher", "-q", "-l", "trace"]);
        assert_eq!(cli.effective_log_level(Some(&config)), "warn");
    }

    #[test]
    fn test_log_format_precedence() {
        let config = LoggingConfig {
            format: usher_config::LogFormat::Json,
            ..Default::default()
        };

        let cli = Cli::parse_from(["usher"]);
        assert_eq!(cli.effective_log_format(Some(&config)), LogFormat::Json);

        let cli = Cli::parse_from(["usher", "--log-format", "compact"]);
        assert_eq!(cli.effective_log_format(Some(&config)), LogFormat::Compact);
    }

    #[test]
    fn test_known_levels() {
        assert!(is_known_level("debug"));
        assert!(!is_known_level("loud"));
    }
}
