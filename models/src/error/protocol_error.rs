use crate::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Reasons an inbound message is rejected before dispatch.
///
/// None of these close the connection; the relay logs and drops the message.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
    #[error("Malformed JSON Error: {message} {location}")]
    MalformedJson {
        message: String,
        location: ErrorLocation,
    },

    #[error("Not An Object Error: expected a JSON object, got {found} {location}")]
    NotAnObject {
        found: &'static str,
        location: ErrorLocation,
    },

    #[error("Missing Keys Error: {keys:?} {location}")]
    MissingKeys {
        keys: Vec<&'static str>,
        location: ErrorLocation,
    },

    #[error("Unexpected Keys Error: {keys:?} {location}")]
    UnexpectedKeys {
        keys: Vec<String>,
        location: ErrorLocation,
    },

    #[error("Invalid Field Error: '{field}' must be a string {location}")]
    InvalidField {
        field: &'static str,
        location: ErrorLocation,
    },

    #[error("Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },
}

impl From<serde_json::Error> for ProtocolError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        ProtocolError::MalformedJson {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
