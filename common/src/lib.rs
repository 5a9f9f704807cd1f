//! Shared primitives for frame-host.
//!
//! This crate holds the small pieces every other crate in the workspace
//! depends on. Today that is only error location tracking.
//!
//! ## Architecture
//!
//! - **common** (this crate): Shared primitives
//! - **models**: Pure data (envelopes, launch arguments, window options)
//! - **host-core**: Registry, dispatcher, broker, relay, orchestrator
//! - **frame-host**: Application wiring everything together

pub mod error;

pub use error::error_location::ErrorLocation;
