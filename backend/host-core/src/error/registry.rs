use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("Invalid Command Name Error: {message} {location}")]
    InvalidName {
        message: String,
        location: ErrorLocation,
    },
}
