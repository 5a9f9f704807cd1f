//! The four-field message unit exchanged with frontends and the native process.

use crate::ErrorLocation;
use crate::error::protocol_error::ProtocolError;

use std::panic::Location;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Keys every envelope carries, in wire order.
pub const ENVELOPE_KEYS: [&str; 4] = ["cmd", "result_id", "error_id", "payload"];

const CMD_KEY: &str = "cmd";
const RESULT_ID_KEY: &str = "result_id";
const ERROR_ID_KEY: &str = "error_id";
const PAYLOAD_KEY: &str = "payload";

/// A request or response on the wire.
///
/// Responses populate exactly one of `result_id` (success) or `error_id`
/// (failure); the other is an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub cmd: String,
    pub result_id: String,
    pub error_id: String,
    pub payload: Value,
}

impl Envelope {
    pub fn new(
        cmd: impl Into<String>,
        result_id: impl Into<String>,
        error_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            cmd: cmd.into(),
            result_id: result_id.into(),
            error_id: error_id.into(),
            payload,
        }
    }

    /// Response carrying a successful result under `result_id`.
    pub fn success(cmd: impl Into<String>, result_id: impl Into<String>, payload: Value) -> Self {
        Self::new(cmd, result_id, String::new(), payload)
    }

    /// Response carrying an error description under `error_id`.
    pub fn failure(
        cmd: impl Into<String>,
        error_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let payload = ErrorPayload::new(message).into_value();
        Self::new(cmd, String::new(), error_id, payload)
    }

    /// True when this envelope reports a failure.
    pub fn is_failure(&self) -> bool {
        self.result_id.is_empty() && !self.error_id.is_empty()
    }

    /// Parse a text frame, enforcing the exact four-key shape.
    #[track_caller]
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Validate an already-decoded JSON value as an envelope.
    #[track_caller]
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(mut map) = value else {
            return Err(ProtocolError::NotAnObject {
                found: json_kind(&value),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let missing: Vec<&'static str> = ENVELOPE_KEYS
            .iter()
            .copied()
            .filter(|key| !map.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(ProtocolError::MissingKeys {
                keys: missing,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if map.len() != ENVELOPE_KEYS.len() {
            let mut extra: Vec<String> = map
                .keys()
                .filter(|key| !ENVELOPE_KEYS.contains(&key.as_str()))
                .cloned()
                .collect();
            extra.sort();
            return Err(ProtocolError::UnexpectedKeys {
                keys: extra,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let cmd = take_string(&mut map, CMD_KEY)?;
        let result_id = take_string(&mut map, RESULT_ID_KEY)?;
        let error_id = take_string(&mut map, ERROR_ID_KEY)?;
        let payload = map.remove(PAYLOAD_KEY).unwrap_or(Value::Null);

        Ok(Self {
            cmd,
            result_id,
            error_id,
            payload,
        })
    }

    /// Serialize to a single-line JSON text frame.
    #[track_caller]
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

#[track_caller]
fn take_string(map: &mut Map<String, Value>, field: &'static str) -> Result<String, ProtocolError> {
    match map.remove(field) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(ProtocolError::InvalidField {
            field,
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Error description carried in a failure envelope's payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn into_value(self) -> Value {
        json!({ "message": self.message })
    }

    /// Decode whatever a peer put in a failure payload.
    ///
    /// Accepts `{"message": ...}`, a bare string, or any other JSON (rendered as text).
    pub fn from_payload(payload: &Value) -> Self {
        match payload {
            Value::Object(map) => match map.get("message") {
                Some(Value::String(message)) => Self::new(message.clone()),
                _ => Self::new(payload.to_string()),
            },
            Value::String(message) => Self::new(message.clone()),
            other => Self::new(other.to_string()),
        }
    }
}
