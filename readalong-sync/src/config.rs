//! Configuration management for readalong-sync
//!
//! Two sources, merged in priority order:
//! 1. Command-line arguments / environment variables (clap)
//! 2. Optional TOML bootstrap file
//! 3. Built-in defaults
//!
//! The TOML file is bootstrap-only: the service must restart to pick up
//! changes. Calibration is absent here; it is session state, owned by the
//! engine, never persisted.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

/// Default HTTP port for the sync service
fn default_port() -> u16 {
    5760
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Bootstrap configuration loaded from a TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Path to the transcript JSON document
    #[serde(default)]
    pub transcript_path: Option<PathBuf>,

    /// Path to the chapters JSON document
    #[serde(default)]
    pub chapters_path: Option<PathBuf>,

    /// Drive playback with the built-in simulated player
    #[serde(default)]
    pub simulate: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub transcript_path: Option<PathBuf>,
    pub chapters_path: Option<PathBuf>,
    pub simulate: bool,
}

/// Complete resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub port: u16,

    /// Transcript document to load (required)
    pub transcript_path: PathBuf,

    /// Chapter document to load; absent means no chapter navigation
    pub chapters_path: Option<PathBuf>,

    /// Whether to run the simulated player instead of waiting for an
    /// external one
    pub simulate: bool,
}

impl Config {
    /// Resolve configuration from CLI overrides and the optional TOML file
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let toml_config: TomlConfig = match &overrides.config_path {
            Some(path) => {
                let config = readalong_common::config::load_toml(path)
                    .map_err(|e| Error::Config(e.to_string()))?;
                info!("Loaded TOML configuration from {:?}", path);
                config
            }
            None => TomlConfig::default(),
        };

        let transcript_path = overrides
            .transcript_path
            .or(toml_config.transcript_path)
            .ok_or_else(|| {
                Error::Config(
                    "no transcript document configured (--transcript or transcript_path)"
                        .to_string(),
                )
            })?;

        Ok(Config {
            port: overrides
                .port
                .or(toml_config.port)
                .unwrap_or_else(default_port),
            transcript_path,
            chapters_path: overrides.chapters_path.or(toml_config.chapters_path),
            simulate: overrides.simulate || toml_config.simulate,
        })
    }
}
