pub mod broker;
pub mod config;
pub mod handler;
pub mod link;
pub mod orchestrator;
pub mod registry;
pub mod relay;
pub mod signal;
pub mod spawn;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Registry(#[from] registry::RegistryError),

    #[error(transparent)]
    Broker(#[from] broker::BrokerError),

    #[error(transparent)]
    Relay(#[from] relay::RelayError),

    #[error(transparent)]
    Link(#[from] link::LinkError),

    #[error(transparent)]
    Signal(#[from] signal::SignalError),

    #[error(transparent)]
    Spawn(#[from] spawn::SpawnError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Orchestrator(#[from] orchestrator::OrchestratorError),
}
