//! Command-line interface parsing for the starship proxy
//!
//! This module handles parsing of CLI arguments using clap and applying them
//! on top of the loaded configuration.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::{Config, JwtConfig};

/// Log levels accepted by `--log-level`
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified log level is not recognized
    #[error("Invalid log level: '{0}'. Valid levels: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Starship proxy - serves the Star Wars starship catalog with filtering and caching
#[derive(Parser, Debug)]
#[command(name = "starship-proxy")]
#[command(about = "Filtering, caching proxy for the Star Wars starship catalog")]
#[command(version)]
pub struct Cli {
    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    pub host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// HMAC key for validating JWT bearer tokens on the starships endpoint
    #[arg(long, value_name = "KEY", env = "STARSHIP_PROXY_JWT_KEY", hide_env_values = true)]
    pub jwt_key: Option<String>,

    /// Log level
    ///
    /// Ignored when RUST_LOG is set.
    #[arg(short = 'v', long, default_value = "info", value_parser = parse_log_level)]
    pub log_level: String,
}

/// Validates a log level argument, normalizing it to lower case
pub fn parse_log_level(s: &str) -> Result<String, CliError> {
    let level = s.trim().to_lowercase();
    if LOG_LEVELS.contains(&level.as_str()) {
        Ok(level)
    } else {
        Err(CliError::InvalidLogLevel(s.to_string()))
    }
}

impl Cli {
    /// Applies the command-line overrides to `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(key) = &self.jwt_key {
            match config.server.jwt.as_mut() {
                Some(jwt) => jwt.key = key.clone(),
                None => config.server.jwt = Some(JwtConfig::new(key.clone())),
            }
        }
    }

    /// Default tracing filter directive for the chosen log level
    pub fn log_filter(&self) -> String {
        format!("starship_proxy={0},tower_http={0}", self.log_level)
    }
}
