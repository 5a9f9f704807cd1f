//! WebSocket relay between frontends and the dispatcher.
//!
//! Every response is broadcast to all connected clients, not only to the one
//! that sent the request. Frontends pick out their own responses by id.

mod clients;
mod server;

pub use clients::ClientSet;
pub use server::RelayServer;
