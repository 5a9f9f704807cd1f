use crate::error::broker::BrokerError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Failure raised by a command handler.
///
/// Never propagated out of dispatch; it is rendered into the error slot of
/// the response envelope.
#[derive(Debug, ThisError)]
pub enum HandlerError {
    #[error("Invalid Arguments Error: {message} {location}")]
    InvalidArguments {
        message: String,
        location: ErrorLocation,
    },

    #[error("Handler Error: {message} {location}")]
    Failed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Result Serialization Error: {message} {location}")]
    Serialization {
        message: String,
        location: ErrorLocation,
    },
}

impl HandlerError {
    #[track_caller]
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Message sent back to frontends, without the source location.
    pub fn description(&self) -> &str {
        match self {
            HandlerError::InvalidArguments { message, .. }
            | HandlerError::Failed { message, .. }
            | HandlerError::Serialization { message, .. } => message,
        }
    }
}

impl From<BrokerError> for HandlerError {
    #[track_caller]
    fn from(error: BrokerError) -> Self {
        HandlerError::Failed {
            message: error.description().to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
