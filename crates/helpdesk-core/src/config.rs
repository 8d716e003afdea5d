use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{HelpdeskError, Result};

/// Top-level configuration for the helpdesk service.
///
/// Loaded from `~/.helpdesk/config.toml` by default. Every section falls
/// back to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub escalation: EscalationConfig,
}

impl HelpdeskConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HelpdeskConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HelpdeskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory for the SQLite database and the session token file.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// HTTP port the API binds to on localhost.
    pub port: u16,
    /// Login tokens older than this are rejected and pruned.
    pub token_ttl_hours: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.helpdesk/data".to_string(),
            log_level: "info".to_string(),
            port: 3030,
            token_ttl_hours: 168,
        }
    }
}

/// Which primary source backs the record stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Local SQLite database under `general.data_dir`.
    #[default]
    Sqlite,
    /// A json-server style REST endpoint at `store.remote_url`.
    Remote,
}

/// Record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Base URL of the remote REST store.
    pub remote_url: String,
    /// Per-request timeout for the remote store, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            remote_url: "http://localhost:5000".to_string(),
            timeout_ms: 3000,
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Simulated typing delay before assistant replies, in milliseconds.
    pub typing_delay_ms: u64,
    /// Maximum accepted message length in characters.
    pub max_message_length: usize,
    /// Idle conversations older than this are evicted.
    pub session_timeout_minutes: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_delay_ms: 1000,
            max_message_length: 2000,
            session_timeout_minutes: 30,
        }
    }
}

/// How an escalation form is delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationMode {
    /// Append to the issue store.
    #[default]
    Store,
    /// Hand back a pre-filled `mailto:` compose link.
    Mailto,
}

/// Escalation and support contact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub mode: EscalationMode,
    pub support_email: String,
    pub support_phone: String,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            mode: EscalationMode::Store,
            support_email: "support@example.com".to_string(),
            support_phone: "+1 (555) 123-4567".to_string(),
        }
    }
}
