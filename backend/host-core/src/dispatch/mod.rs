//! Turns a command name plus raw payload into a response envelope.

use crate::registry::CommandRegistry;

use models::Envelope;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use log::{debug, error, warn};
use serde_json::Value;

/// Error message delivered when a handler panics.
pub const HANDLER_PANICKED: &str = "handler panicked";

/// Drives handlers from the registry and shapes their outcome into envelopes.
///
/// Handler failures, panics included, never escape `dispatch`; they are
/// delivered to the peer in the error slot of the response.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Run every handler registered under `name`.
    ///
    /// Returns `None` for an unknown command. Otherwise handlers run in
    /// registration order; the first failure stops the chain and becomes the
    /// error response, and if all succeed the last handler's result is the
    /// success response.
    pub async fn dispatch(
        &self,
        name: &str,
        result_id: &str,
        error_id: &str,
        payload: Value,
    ) -> Option<Envelope> {
        let Some(entry) = self.registry.get(name) else {
            warn!(
                "Unknown command '{name}'; registered commands: {:?}",
                self.registry.list_commands().keys().collect::<Vec<_>>()
            );
            return None;
        };

        let mut last = Value::Null;
        for handler in entry.handlers() {
            let outcome = AssertUnwindSafe(handler.call(payload.clone()))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(value)) => last = value,
                Ok(Err(e)) => {
                    warn!("Command '{name}' failed: {e}");
                    return Some(Envelope::failure(name, error_id, e.description()));
                }
                Err(panic) => {
                    error!(
                        "Command '{name}' panicked: {}",
                        panic_message(panic.as_ref())
                    );
                    return Some(Envelope::failure(name, error_id, HANDLER_PANICKED));
                }
            }
        }

        debug!("Command '{name}' succeeded (result_id={result_id})");
        Some(Envelope::success(name, result_id, last))
    }

    pub async fn dispatch_envelope(&self, request: Envelope) -> Option<Envelope> {
        let Envelope {
            cmd,
            result_id,
            error_id,
            payload,
        } = request;
        self.dispatch(&cmd, &result_id, &error_id, payload).await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
