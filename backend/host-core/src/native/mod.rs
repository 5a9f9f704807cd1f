//! Everything that talks to the rendering process: its request/response link
//! and control over its OS process.

pub mod link;
pub mod process;

pub use link::{connect_native, run_link, serve_native_link, socket_path};
pub use process::{
    ChildProcess, EscalationPolicy, ManagedProcess, TerminationOutcome, spawn_native,
    terminate_process_safely,
};
