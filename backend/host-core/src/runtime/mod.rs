//! Session lifecycle: the cross-process shutdown signal, the supervised task
//! group, the per-session context and the orchestrator driving them.

pub mod context;
pub mod orchestrator;
pub mod signal;
pub mod tasks;

pub use context::RuntimeContext;
pub use orchestrator::{LifecycleState, Orchestrator};
pub use signal::ShutdownSignal;
pub use tasks::{DrainReport, TaskGroup};
