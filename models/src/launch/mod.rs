//! Positional launch arguments for the native rendering process.

pub mod builder;

use std::path::PathBuf;

/// A validated set of arguments for one native process launch.
///
/// Construct through [`builder::NativeLaunchBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeLaunch {
    pub(crate) binary: PathBuf,
    pub(crate) config_json: String,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) channel_name: String,
    pub(crate) shutdown_signal: PathBuf,
}

impl NativeLaunch {
    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    pub fn config_json(&self) -> &str {
        &self.config_json
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn shutdown_signal(&self) -> &PathBuf {
        &self.shutdown_signal
    }

    /// Positional argv in the order the rendering process reads it:
    /// `(config, host, port, channel_name, shutdown_signal)`.
    pub fn args(&self) -> Vec<String> {
        vec![
            self.config_json.clone(),
            self.host.clone(),
            self.port.to_string(),
            self.channel_name.clone(),
            self.shutdown_signal.to_string_lossy().into_owned(),
        ]
    }

    /// URL the rendering process injects into the page to reach the relay.
    pub fn socket_url(&self) -> String {
        format!("ws://{}:{}/ws", self.host, self.port)
    }
}
