//! Runtime core of frame-host.
//!
//! Holds the command registry and dispatcher, the correlation broker used for
//! host-issued calls into the rendering process, the WebSocket relay that fans
//! responses out to every connected frontend, and the orchestrator that
//! supervises the rendering process for one session.

pub mod api;
pub mod broker;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod native;
pub mod registry;
pub mod relay;
pub mod runtime;
pub mod utils;

#[cfg(test)]
mod tests;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ADDRESS: &str = const_format::concatcp!(DEFAULT_HOST, ":", DEFAULT_PORT);
pub const DEFAULT_CHANNEL_NAME: &str = "frame_host_pipe";
pub const SHUTDOWN_SIGNAL_EXTENSION: &str = "shutdown";
pub const NATIVE_SOCKET_EXTENSION: &str = "sock";
