use common::ErrorLocation;

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading, writing or renaming a config file failed.
    #[error("Config Io Error: failed to {action} {}: {source} {location}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: IoError,
        location: ErrorLocation,
    },

    #[error("Config Parse Error: {}: {reason} {location}", path.display())]
    ParseError {
        path: PathBuf,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Config Serialization Error: {reason} {location}")]
    SerializeError {
        reason: String,
        location: ErrorLocation,
    },

    #[error("Config Validation Error: {reason} {location}")]
    ValidationError {
        reason: String,
        location: ErrorLocation,
    },
}

impl ConfigError {
    #[track_caller]
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: IoError) -> Self {
        ConfigError::Io {
            action,
            path: path.into(),
            source,
            location: ErrorLocation::from(std::panic::Location::caller()),
        }
    }
}
