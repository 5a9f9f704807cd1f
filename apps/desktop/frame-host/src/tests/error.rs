// Unit tests for error module

use crate::error::AppError;

use host_core::error::CoreError;
use host_core::error::registry::RegistryError;

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Tests that errors serialize with their variant tag.
///
/// **WHY THIS MATTERS**: Status output is emitted as JSON. If serialization
/// breaks, failures show up as opaque strings.
///
/// **BUG THIS CATCHES**: Would catch if someone removes the `#[derive(Serialize)]`
/// or adds a non-serializable field.
#[test]
fn given_app_error_when_serialized_then_contains_variant_and_message() {
    // GIVEN: An AppError
    let err = AppError::Cache {
        message: String::from("Test"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Serializing to JSON
    let json = serde_json::to_string(&err).unwrap();

    // THEN: The tag and message are present
    assert!(json.contains("\"type\":\"Cache\""), "JSON should contain variant tag");
    assert!(json.contains("Test"), "JSON should contain message");
}

/// **VALUE**: Verifies that core errors keep their text when flattened.
///
/// **WHY THIS MATTERS**: The binary prints AppError on failure. Losing the
/// core message would hide why a session failed to start.
///
/// **BUG THIS CATCHES**: Would catch if the From impl dropped the source message.
#[test]
fn given_core_error_when_converted_then_message_preserved() {
    // GIVEN: A core error
    let core = CoreError::from(RegistryError::InvalidName {
        message: String::from("bad name '1x'"),
        location: ErrorLocation::from(Location::caller()),
    });

    // WHEN: Converting into AppError
    let err = AppError::from(core);

    // THEN: It is a Core variant carrying the original text
    match err {
        AppError::Core { message, .. } => assert!(message.contains("bad name '1x'")),
        other => panic!("expected Core, got {other:?}"),
    }
}
