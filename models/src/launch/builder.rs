use crate::error::model_error::ModelError;
use crate::{ErrorLocation, NativeLaunch};

use std::panic::Location;
use std::path::PathBuf;

/// Builder for creating validated NativeLaunch instances.
///
/// The config is carried as an opaque JSON document; it is only checked to
/// parse as a JSON object.
#[derive(Debug, Default)]
pub struct NativeLaunchBuilder {
    binary: Option<PathBuf>,
    config_json: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    channel_name: Option<String>,
    shutdown_signal: Option<PathBuf>,
}

impl NativeLaunchBuilder {
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    pub fn with_config_json(mut self, config_json: impl Into<String>) -> Self {
        self.config_json = Some(config_json.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_channel_name(mut self, channel_name: impl Into<String>) -> Self {
        self.channel_name = Some(channel_name.into());
        self
    }

    pub fn with_shutdown_signal(mut self, path: impl Into<PathBuf>) -> Self {
        self.shutdown_signal = Some(path.into());
        self
    }

    /// Build the NativeLaunch with validation.
    #[track_caller]
    pub fn build(self) -> Result<NativeLaunch, ModelError> {
        let binary = self.binary.ok_or_else(|| ModelError::Validation {
            message: String::from("Binary is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if binary.as_os_str().is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Binary cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let config_json = self.config_json.ok_or_else(|| ModelError::Validation {
            message: String::from("Config is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        match serde_json::from_str::<serde_json::Value>(&config_json) {
            Ok(serde_json::Value::Object(_)) => {}
            Ok(_) => {
                return Err(ModelError::Validation {
                    message: String::from("Config must be a JSON object"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Err(e) => {
                return Err(ModelError::Validation {
                    message: format!("Config is not valid JSON: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        let host = self.host.ok_or_else(|| ModelError::Validation {
            message: String::from("Host is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if host.is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Host cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let port = self.port.ok_or_else(|| ModelError::Validation {
            message: String::from("Port is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if port == 0 {
            return Err(ModelError::Validation {
                message: String::from("Port must be non-zero"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let channel_name = self.channel_name.ok_or_else(|| ModelError::Validation {
            message: String::from("Channel name is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if channel_name.is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Channel name cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if channel_name.contains(['/', '\\']) {
            return Err(ModelError::Validation {
                message: format!("Channel name cannot contain path separators: {channel_name}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let shutdown_signal = self.shutdown_signal.ok_or_else(|| ModelError::Validation {
            message: String::from("Shutdown signal path is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if shutdown_signal.as_os_str().is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Shutdown signal path cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(NativeLaunch {
            binary,
            config_json,
            host,
            port,
            channel_name,
            shutdown_signal,
        })
    }
}
