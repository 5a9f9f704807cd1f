//! Wire and launch data for frame-host.
//!
//! Pure data structures passed between the relay, the broker and the
//! orchestrator. No I/O lives here.

pub mod envelope;
pub mod error;
pub mod launch;
pub mod window;

pub use common::ErrorLocation;
pub use envelope::{ENVELOPE_KEYS, Envelope, ErrorPayload};
pub use error::model_error::ModelError;
pub use error::protocol_error::ProtocolError;
pub use launch::NativeLaunch;
pub use launch::builder::NativeLaunchBuilder;
pub use window::{Position, Rgba, Size, Theme, UnitType, WebViewOptions, WindowOptions};

#[cfg(test)]
mod tests;
