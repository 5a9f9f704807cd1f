use crate::error::relay::RelayError;
use crate::utils::{find_free_port, normalize_args, split_address};

use serde_json::json;

/// **VALUE**: Verifies address splitting.
///
/// **WHY THIS MATTERS**: The relay address is accepted as one string on the
/// command line and in logs.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - IPv6 literals are split at the wrong colon
/// - Out-of-range ports are accepted
#[test]
fn given_addresses_when_splitting_then_validates_host_and_port() {
    // GIVEN / WHEN / THEN
    assert_eq!(
        split_address("127.0.0.1:8080").unwrap(),
        ("127.0.0.1".to_string(), 8080)
    );
    assert_eq!(split_address("[::1]:9000").unwrap(), ("::1".to_string(), 9000));
    assert!(split_address("localhost").is_err());
    assert!(split_address(":8080").is_err());
    assert!(split_address("host:70000").is_err());
}

/// **VALUE**: Verifies that a bad address is reported as an address error.
///
/// **WHY THIS MATTERS**: `--address` typos should read as a usage mistake,
/// not as a socket failure.
///
/// **BUG THIS CATCHES**: Would catch validation failures surfacing as `RelayError::Io`.
#[test]
fn given_malformed_address_when_splitting_then_invalid_address_error() {
    // GIVEN / WHEN
    let missing_port = split_address("localhost");
    let bad_port = split_address("localhost:http");

    // THEN
    for result in [missing_port, bad_port] {
        let err = result.unwrap_err();
        assert!(matches!(err, RelayError::InvalidAddress { .. }), "got {err:?}");
        assert!(err.to_string().starts_with("Invalid Address Error:"));
    }
}

/// **VALUE**: Verifies that a free port can be found.
///
/// **WHY THIS MATTERS**: Used when the configured relay port is busy.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Port 0 leaks out instead of the assigned port
#[test]
fn given_os_when_finding_free_port_then_returns_nonzero() {
    // GIVEN / WHEN
    let port = find_free_port().unwrap();

    // THEN
    assert_ne!(port, 0);
}

/// **VALUE**: Verifies argument normalization rules.
///
/// **WHY THIS MATTERS**: The rendering process always expects positional args.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Arrays are double-wrapped
/// - Objects are spread instead of wrapped
#[test]
fn given_values_when_normalizing_then_always_returns_array() {
    // GIVEN / WHEN / THEN
    assert_eq!(normalize_args(json!(null)), json!([]));
    assert_eq!(normalize_args(json!([1, 2])), json!([1, 2]));
    assert_eq!(normalize_args(json!("x")), json!(["x"]));
    assert_eq!(normalize_args(json!({"a": 1})), json!([{"a": 1}]));
}
