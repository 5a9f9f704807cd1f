//! Small helpers shared by the relay, broker and CLI.

use crate::error::relay::RelayError;

use common::ErrorLocation;

use std::net::{Ipv4Addr, TcpListener as StdTcpListener};
use std::panic::Location;

use serde_json::Value;

/// Split `"host:port"` into its parts.
///
/// The last colon separates the port, so bracketed IPv6 literals such as
/// `"[::1]:8080"` keep their inner colons.
#[track_caller]
pub fn split_address(address: &str) -> Result<(String, u16), RelayError> {
    let location = ErrorLocation::from(Location::caller());
    let invalid = |reason: &str| RelayError::InvalidAddress {
        message: format!("Invalid address '{address}': {reason}"),
        location,
    };

    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| invalid("expected host:port"))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid("host is empty"));
    }

    let port = port
        .parse::<u16>()
        .map_err(|_| invalid("port must be an integer between 0 and 65535"))?;

    Ok((host.to_string(), port))
}

/// Ask the OS for a currently unused loopback TCP port.
///
/// The port is released before returning, so another process may claim it
/// first; callers that can bind directly to port 0 should prefer that.
#[track_caller]
pub fn find_free_port() -> Result<u16, RelayError> {
    let listener = StdTcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}

/// Normalize host-issued call arguments into a JSON array.
///
/// `null` becomes `[]`, an array is kept, any other value is wrapped.
pub fn normalize_args(args: Value) -> Value {
    match args {
        Value::Null => Value::Array(Vec::new()),
        Value::Array(items) => Value::Array(items),
        other => Value::Array(vec![other]),
    }
}
