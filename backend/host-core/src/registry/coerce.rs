use crate::error::handler::HandlerError;

use common::ErrorLocation;

use std::any::type_name;
use std::panic::Location;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a raw payload into a handler's argument type.
///
/// The payload is tried as-is first. Frontends also wrap arguments in a few
/// conventional shapes, so on failure these are unwrapped and retried:
/// an empty object or array stands for "no arguments" (`null`), and a
/// one-element array or a one-field object stands for its single value.
#[track_caller]
pub fn coerce_args<A: DeserializeOwned>(payload: Value) -> Result<A, HandlerError> {
    let location = ErrorLocation::from(Location::caller());

    let first_error = match serde_json::from_value::<A>(payload.clone()) {
        Ok(args) => return Ok(args),
        Err(e) => e,
    };

    let fallback = match payload {
        Value::Object(map) if map.is_empty() => Some(Value::Null),
        Value::Array(items) if items.is_empty() => Some(Value::Null),
        Value::Array(mut items) if items.len() == 1 => items.pop(),
        Value::Object(map) if map.len() == 1 => map.into_iter().next().map(|(_, v)| v),
        _ => None,
    };

    fallback
        .and_then(|value| serde_json::from_value::<A>(value).ok())
        .ok_or_else(|| HandlerError::InvalidArguments {
            message: format!("Cannot decode payload as {}: {first_error}", type_name::<A>()),
            location,
        })
}
