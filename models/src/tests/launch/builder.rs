use crate::{ModelError, NativeLaunchBuilder};

fn complete_builder() -> NativeLaunchBuilder {
    NativeLaunchBuilder::default()
        .with_binary("/usr/local/bin/frame-native")
        .with_config_json(r#"{"title":"demo"}"#)
        .with_host("127.0.0.1")
        .with_port(8080)
        .with_channel_name("frame_host_pipe")
        .with_shutdown_signal("/tmp/frame_host_pipe-abc.shutdown")
}

/// **VALUE**: Verifies that the positional argv order matches what the
/// rendering process reads.
///
/// **WHY THIS MATTERS**: The rendering process reads its arguments by position.
/// A swapped pair (e.g. host and port) would make it connect to the wrong place
/// or fail to parse its config.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `args()` reorders fields during refactoring
/// - The port is rendered as something other than its decimal string
#[test]
fn given_complete_builder_when_building_then_args_are_positional() {
    // GIVEN: A builder with every field set
    let builder = complete_builder();

    // WHEN: Building and rendering argv
    let launch = builder.build().unwrap();
    let args = launch.args();

    // THEN: Order is (config, host, port, channel_name, shutdown_signal)
    assert_eq!(
        args,
        vec![
            r#"{"title":"demo"}"#.to_string(),
            "127.0.0.1".to_string(),
            "8080".to_string(),
            "frame_host_pipe".to_string(),
            "/tmp/frame_host_pipe-abc.shutdown".to_string(),
        ]
    );
}

/// **VALUE**: Verifies the relay URL handed to the page.
///
/// **WHY THIS MATTERS**: The page connects back to the relay through this URL;
/// a wrong path or scheme leaves the frontend disconnected.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The `/ws` path suffix is dropped
/// - The scheme changes away from `ws://`
#[test]
fn given_launch_when_rendering_socket_url_then_uses_ws_scheme_and_path() {
    // GIVEN: A valid launch
    let launch = complete_builder().build().unwrap();

    // WHEN: Rendering the socket URL
    let url = launch.socket_url();

    // THEN: ws://host:port/ws
    assert_eq!(url, "ws://127.0.0.1:8080/ws");
}

/// **VALUE**: Verifies that builder validation rejects a zero port.
///
/// **WHY THIS MATTERS**: Port 0 means "any port" to the OS. The rendering process
/// would be told to connect to a port nothing listens on.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The non-zero check is removed
/// - An unresolved ephemeral port leaks into the launch
#[test]
fn given_zero_port_when_building_then_returns_validation_error() {
    // GIVEN: Builder with port set to zero
    let builder = complete_builder().with_port(0);

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result.unwrap_err() {
        ModelError::Validation { message, .. } => {
            assert_eq!(message, "Port must be non-zero");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// **VALUE**: Verifies that builder validation rejects a missing binary.
///
/// **WHY THIS MATTERS**: There is nothing to spawn without a binary.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Required field validation is removed
/// - Builder allows incomplete construction
#[test]
fn given_missing_binary_when_building_then_returns_validation_error() {
    // GIVEN: Builder without a binary
    let builder = NativeLaunchBuilder::default()
        .with_config_json("{}")
        .with_host("127.0.0.1")
        .with_port(8080)
        .with_channel_name("frame_host_pipe")
        .with_shutdown_signal("/tmp/x.shutdown");

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    match result.unwrap_err() {
        ModelError::Validation { message, .. } => {
            assert_eq!(message, "Binary is required");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// **VALUE**: Verifies that a non-object config is rejected.
///
/// **WHY THIS MATTERS**: The rendering process expects a JSON object of window
/// options. An array or a truncated document would crash it at startup, after
/// the host already believes the session is Running.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Config JSON checks are removed
/// - Arrays or scalars are accepted as config
#[test]
fn given_non_object_config_when_building_then_returns_validation_error() {
    // GIVEN: Builders with an array config and a malformed config
    let array = complete_builder().with_config_json("[1,2]");
    let malformed = complete_builder().with_config_json("{\"title\":");

    // WHEN: Attempting to build both
    let array_result = array.build();
    let malformed_result = malformed.build();

    // THEN: Both are rejected
    match array_result.unwrap_err() {
        ModelError::Validation { message, .. } => {
            assert_eq!(message, "Config must be a JSON object");
        }
        other => panic!("unexpected error: {other}"),
    }
    match malformed_result.unwrap_err() {
        ModelError::Validation { message, .. } => {
            assert!(message.starts_with("Config is not valid JSON"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// **VALUE**: Verifies that channel names cannot escape the temp directory.
///
/// **WHY THIS MATTERS**: The channel name becomes part of a socket path and a
/// latch file path. A separator would place those files somewhere else.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The separator check is removed
#[test]
fn given_channel_name_with_separator_when_building_then_returns_validation_error() {
    // GIVEN: Builder with a path-like channel name
    let builder = complete_builder().with_channel_name("../evil");

    // WHEN: Attempting to build
    let result = builder.build();

    // THEN: Should return validation error
    assert!(matches!(result, Err(ModelError::Validation { .. })));
}
