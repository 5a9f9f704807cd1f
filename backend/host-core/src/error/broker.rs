use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum BrokerError {
    #[error("Call Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Remote Error: {message} {location}")]
    Remote {
        message: String,
        location: ErrorLocation,
    },

    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Send Error: {message} {location}")]
    Send {
        message: String,
        location: ErrorLocation,
    },

    #[error("Shutdown Error: {message} {location}")]
    Shutdown {
        message: String,
        location: ErrorLocation,
    },
}

impl BrokerError {
    pub fn description(&self) -> &str {
        match self {
            BrokerError::Timeout { message, .. }
            | BrokerError::Remote { message, .. }
            | BrokerError::Decode { message, .. }
            | BrokerError::Encode { message, .. }
            | BrokerError::Send { message, .. }
            | BrokerError::Shutdown { message, .. } => message,
        }
    }
}
