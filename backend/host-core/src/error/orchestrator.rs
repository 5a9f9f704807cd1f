use crate::error::relay::RelayError;
use crate::error::signal::SignalError;
use crate::error::spawn::SpawnError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum OrchestratorError {
    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("Lifecycle Error: {message} {location}")]
    Lifecycle {
        message: String,
        location: ErrorLocation,
    },

    #[error("Termination Error: {message} {location}")]
    Termination {
        message: String,
        location: ErrorLocation,
    },
}
