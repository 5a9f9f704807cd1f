use crate::error::handler::HandlerError;
use crate::registry::coerce::coerce_args;

use common::ErrorLocation;

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, HandlerError>> + Send>>;

type ErasedHandler = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// Argument and result shapes of a registered handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerDescriptor {
    pub args_type: &'static str,
    pub result_type: &'static str,
}

impl fmt::Display for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) -> {}", self.args_type, self.result_type)
    }
}

#[derive(Clone)]
pub struct RegisteredHandler {
    descriptor: HandlerDescriptor,
    handler: ErasedHandler,
}

impl RegisteredHandler {
    pub(crate) fn new<A, R, F, Fut>(handler: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |payload: Value| -> HandlerFuture {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let args: A = coerce_args(payload)?;
                let result = (*handler)(args).await?;
                serde_json::to_value(result).map_err(|e| HandlerError::Serialization {
                    message: format!("Failed to encode {}: {e}", type_name::<R>()),
                    location: ErrorLocation::from(Location::caller()),
                })
            })
        });

        Self {
            descriptor: HandlerDescriptor {
                args_type: type_name::<A>(),
                result_type: type_name::<R>(),
            },
            handler: erased,
        }
    }

    pub fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }

    pub fn call(&self, payload: Value) -> HandlerFuture {
        (self.handler)(payload)
    }
}
