//! CLI argument definitions for the helpdesk service.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use helpdesk_core::config::{HelpdeskConfig, StoreBackend};

/// Helpdesk: a guided IT-support chat assistant.
#[derive(Parser, Debug)]
#[command(name = "helpdesk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Data directory for the SQLite database and session file.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Use a json-server style REST store at this URL instead of SQLite.
    #[arg(long = "remote-url")]
    pub remote_url: Option<String>,

    /// Write the effective configuration to the config path and exit.
    #[arg(long = "write-config")]
    pub write_config: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > HELPDESK_CONFIG env var > ~/.helpdesk/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("HELPDESK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > HELPDESK_PORT env var > config file value > 3030.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("HELPDESK_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        3030
    }

    /// Fold the command-line overrides into a loaded config.
    pub fn apply(&self, config: &mut HelpdeskConfig) {
        config.general.port = self.resolve_port(config.general.port);
        if let Some(dir) = &self.data_dir {
            config.general.data_dir = dir.to_string_lossy().to_string();
        }
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(url) = &self.remote_url {
            config.store.backend = StoreBackend::Remote;
            config.store.remote_url = url.clone();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".helpdesk").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".helpdesk").join("config.toml");
    }
    PathBuf::from("config.toml")
}
