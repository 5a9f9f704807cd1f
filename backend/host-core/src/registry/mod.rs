//! Command name to handler table.
//!
//! Built once at startup and shared read-only (behind an `Arc`) for the rest of
//! the session. Handlers are typed: each one declares its argument and result
//! types, and the registry erases them behind a JSON-in, JSON-out boundary.
//!
//! Registering a second handler under an existing name appends it. Dispatch
//! runs every handler for a name in registration order (see
//! [`crate::dispatch::Dispatcher`]).

mod coerce;
mod handler;

pub use coerce::coerce_args;
pub use handler::{HandlerDescriptor, HandlerFuture, RegisteredHandler};

use crate::error::handler::HandlerError;
use crate::error::registry::RegistryError;

use common::ErrorLocation;

use std::collections::{BTreeMap, HashMap};
use std::future::{Future, ready};
use std::panic::Location;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;

const COMMAND_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_.\-]*$";

static COMMAND_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn command_name_regex() -> &'static Regex {
    COMMAND_NAME_REGEX
        .get_or_init(|| Regex::new(COMMAND_NAME_PATTERN).expect("valid regex pattern"))
}

/// All handlers registered under one name.
pub struct CommandEntry {
    name: String,
    handlers: Vec<RegisteredHandler>,
}

impl CommandEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handlers(&self) -> &[RegisteredHandler] {
        &self.handlers
    }
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async handler under `name`.
    ///
    /// The payload is decoded into `A` before the handler runs and the handler's
    /// `R` is encoded back to JSON for the response.
    #[track_caller]
    pub fn register<A, R, F, Fut>(
        &mut self,
        name: impl Into<String>,
        handler: F,
    ) -> Result<&mut Self, RegistryError>
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        let name = name.into();
        if !command_name_regex().is_match(&name) {
            return Err(RegistryError::InvalidName {
                message: format!("'{name}' does not match {COMMAND_NAME_PATTERN}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let registered = RegisteredHandler::new::<A, R, F, Fut>(handler);
        debug!(
            "Registered command '{name}' ({} -> {})",
            registered.descriptor().args_type,
            registered.descriptor().result_type
        );

        self.commands
            .entry(name.clone())
            .or_insert_with(|| CommandEntry {
                name,
                handlers: Vec::new(),
            })
            .handlers
            .push(registered);

        Ok(self)
    }

    /// Register a handler that completes without suspending.
    #[track_caller]
    pub fn register_sync<A, R, F>(
        &mut self,
        name: impl Into<String>,
        handler: F,
    ) -> Result<&mut Self, RegistryError>
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(A) -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        self.register(name, move |args: A| ready(handler(args)))
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Snapshot of every registered name and its handler shapes, sorted by name.
    pub fn list_commands(&self) -> BTreeMap<String, Vec<HandlerDescriptor>> {
        self.commands
            .values()
            .map(|entry| {
                let descriptors = entry
                    .handlers
                    .iter()
                    .map(|h| h.descriptor().clone())
                    .collect();
                (entry.name.clone(), descriptors)
            })
            .collect()
    }
}
