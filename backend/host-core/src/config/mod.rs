use crate::error::config::ConfigError;
use crate::{DEFAULT_CHANNEL_NAME, DEFAULT_HOST, DEFAULT_PORT};

use common::ErrorLocation;
use models::WindowOptions;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;
const CONFIG_DIR_NAME: &str = "frame-host";

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub allow_remote: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allow_remote: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeConfig {
    pub binary: Option<PathBuf>,
    #[serde(default = "default_channel_name")]
    pub channel_name: String,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            binary: None,
            channel_name: default_channel_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownConfig {
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
    #[serde(default = "default_terminate_ms")]
    pub terminate_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_ms: default_grace_ms(),
            terminate_ms: default_terminate_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

impl BrokerConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub native: NativeConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,

    #[serde(default)]
    pub broker: BrokerConfig,

    #[serde(default)]
    pub window: WindowOptions,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: ServerConfig::default(),
            native: NativeConfig::default(),
            shutdown: ShutdownConfig::default(),
            broker: BrokerConfig::default(),
            window: WindowOptions::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_channel_name() -> String {
    DEFAULT_CHANNEL_NAME.to_string()
}
fn default_grace_ms() -> u64 {
    3000
}
fn default_terminate_ms() -> u64 {
    2000
}
fn default_call_timeout_ms() -> u64 {
    30000
}

/// Per-user configuration directory, `{config_dir}/frame-host`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME))
}

// ============================================
// IMPLEMENTATION
// ============================================

impl HostConfig {
    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(HostConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    #[track_caller]
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {e}");
            ConfigError::io("read", &config_path, e)
        })?;

        let config: HostConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using atomic write.
    ///
    /// Uses temp file + rename so a crash never leaves a half-written file.
    #[track_caller]
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir)
            .map_err(|e| ConfigError::io("create", config_dir, e))?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::io("write", &temp_path, e))?;

        std::fs::rename(&temp_path, &config_path)
            .map_err(|e| ConfigError::io("replace", &config_path, e))?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let location = ErrorLocation::from(Location::caller());
        let invalid = |reason: String| ConfigError::ValidationError { location, reason };

        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(invalid(format!(
                "Invalid version: {} (expected 1-{})",
                self.version, CONFIG_VERSION
            )));
        }

        if self.server.host.trim().is_empty() {
            return Err(invalid("server.host cannot be empty".to_string()));
        }

        let channel = &self.native.channel_name;
        if channel.is_empty() || channel.contains(['/', '\\']) {
            return Err(invalid(format!(
                "native.channel_name must be a non-empty name without path separators: '{channel}'"
            )));
        }

        if let Some(ref binary) = self.native.binary
            && binary.as_os_str().is_empty()
        {
            return Err(invalid("native.binary cannot be an empty path".to_string()));
        }

        if self.shutdown.grace_ms == 0 || self.shutdown.terminate_ms == 0 {
            return Err(invalid(
                "shutdown.grace_ms and shutdown.terminate_ms must be positive".to_string(),
            ));
        }

        if self.broker.call_timeout_ms == 0 {
            return Err(invalid("broker.call_timeout_ms must be positive".to_string()));
        }

        Ok(())
    }
}
