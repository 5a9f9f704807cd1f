//! Wiring for `frame-host run`.

use crate::error::AppError;
use crate::logger::initialize as LoggerInitialize;

use host_core::api::register_builtin_commands;
use host_core::broker::Broker;
use host_core::config::{HostConfig, default_config_dir};
use host_core::error::CoreError;
use host_core::registry::CommandRegistry;
use host_core::runtime::Orchestrator;
use host_core::utils::split_address;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};
use tokio::signal::ctrl_c;

const LOG_DIR_NAME: &str = "logs";

/// Log directory used when `--log-dir` is not given.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("frame-host")
        .join(LOG_DIR_NAME)
}

/// Resolve the config directory, falling back to the platform default.
#[track_caller]
pub fn resolve_config_dir(config_dir: Option<PathBuf>) -> Result<PathBuf, AppError> {
    match config_dir.or_else(default_config_dir) {
        Some(dir) => Ok(dir),
        None => Err(AppError::App {
            message: String::from("No config directory available; pass --config-dir"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

/// Build the registry of built-in commands backed by `broker`.
#[track_caller]
pub fn builtin_registry(broker: &Broker) -> Result<CommandRegistry, AppError> {
    let mut registry = CommandRegistry::default();
    register_builtin_commands(&mut registry, broker)
        .map_err(|e| AppError::from(CoreError::from(e)))?;
    Ok(registry)
}

/// Apply a `HOST:PORT` override to the relay settings.
pub fn apply_address(config: &mut HostConfig, address: &str) -> Result<(), AppError> {
    let (host, port) = split_address(address).map_err(|e| AppError::from(CoreError::from(e)))?;
    config.server.host = host;
    config.server.port = port;
    Ok(())
}

/// Run one session to completion.
///
/// Ctrl-C sets the shutdown signal, which stops the rendering process and
/// every background task.
pub async fn run(
    config_dir: &Path,
    log_dir: &Path,
    address: Option<&str>,
) -> Result<(), AppError> {
    LoggerInitialize(log_dir)?;
    info!("frame-host {} starting", env!("CARGO_PKG_VERSION"));
    info!("Config directory: {}", config_dir.display());

    let mut config =
        HostConfig::load(config_dir).map_err(|e| AppError::from(CoreError::from(e)))?;
    if let Some(address) = address {
        apply_address(&mut config, address)?;
    }
    let broker = Broker::new(config.broker.call_timeout());
    let registry = builtin_registry(&broker)?;

    let orchestrator = Orchestrator::new(config, Arc::new(registry), broker);
    info!("Session {}", orchestrator.context().session_id());

    let signal = orchestrator.context().shutdown_signal().clone();
    let interrupt = tokio::spawn(async move {
        if ctrl_c().await.is_ok() {
            info!("Interrupted; shutting down");
            if let Err(e) = signal.set() {
                error!("Failed to set shutdown signal: {e}");
            }
        }
    });

    let result = orchestrator.run().await;
    interrupt.abort();

    result.map_err(|e| AppError::from(CoreError::from(e)))?;
    info!("frame-host stopped");
    Ok(())
}
