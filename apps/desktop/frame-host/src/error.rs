use host_core::error::CoreError;

use common::ErrorLocation;

use std::panic::Location;

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the frame-host binary.
///
/// Core errors are flattened to their message so the whole enum stays
/// serializable for status output.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum AppError {
    /// Startup wiring failed (directories, logger, registry)
    #[error("App Error: {message} {location}")]
    App {
        message: String,
        location: ErrorLocation,
    },

    /// Error from host-core (config, relay, orchestrator, ...)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// Cache removal failed
    #[error("Cache Error: {message} {location}")]
    Cache {
        message: String,
        location: ErrorLocation,
    },
}

impl From<CoreError> for AppError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        AppError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
