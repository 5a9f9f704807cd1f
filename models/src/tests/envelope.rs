use crate::{Envelope, ErrorPayload, ProtocolError};

use serde_json::json;

/// **VALUE**: Verifies that a well-formed four-key envelope parses.
///
/// **WHY THIS MATTERS**: This is the only accepted shape from frontends.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Field extraction mixes up `result_id` and `error_id`
/// - Payload is dropped or replaced
#[test]
fn given_four_key_object_when_parsing_then_returns_envelope() {
    // GIVEN: A home_dir request
    let raw = r#"{"cmd":"home_dir","result_id":"r1","error_id":"","payload":{}}"#;

    // WHEN: Parsing
    let envelope = Envelope::parse(raw).unwrap();

    // THEN: All fields are carried over
    assert_eq!(envelope.cmd, "home_dir");
    assert_eq!(envelope.result_id, "r1");
    assert_eq!(envelope.error_id, "");
    assert_eq!(envelope.payload, json!({}));
}

/// **VALUE**: Verifies that envelopes missing keys are rejected and the
/// missing keys are reported.
///
/// **WHY THIS MATTERS**: Missing keys must never reach the dispatcher. The log
/// line should say which keys were absent so frontend bugs are easy to trace.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Absent keys are silently defaulted
/// - The reported key list is wrong
#[test]
fn given_missing_keys_when_parsing_then_reports_them() {
    // GIVEN: An envelope with no error_id and no payload
    let raw = r#"{"cmd":"home_dir","result_id":"r1"}"#;

    // WHEN: Parsing
    let result = Envelope::parse(raw);

    // THEN: MissingKeys lists both
    match result.unwrap_err() {
        ProtocolError::MissingKeys { keys, .. } => {
            assert_eq!(keys, vec!["error_id", "payload"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// **VALUE**: Verifies that an envelope with extra keys is rejected.
///
/// **WHY THIS MATTERS**: A well-formed envelope carries exactly four keys.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Only presence of the required keys is checked
#[test]
fn given_extra_key_when_parsing_then_returns_unexpected_keys() {
    // GIVEN: Four keys plus one more
    let raw = r#"{"cmd":"x","result_id":"r","error_id":"e","payload":null,"extra":1}"#;

    // WHEN: Parsing
    let result = Envelope::parse(raw);

    // THEN: The extra key is named
    match result.unwrap_err() {
        ProtocolError::UnexpectedKeys { keys, .. } => assert_eq!(keys, vec!["extra"]),
        other => panic!("unexpected error: {other}"),
    }
}

/// **VALUE**: Verifies rejection of non-object and malformed input.
///
/// **WHY THIS MATTERS**: The relay logs and drops these without closing the
/// connection, so each must map to a distinct recoverable error.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Arrays are treated as envelopes
/// - Invalid JSON panics instead of returning an error
/// - A non-string `cmd` is accepted
#[test]
fn given_non_envelope_input_when_parsing_then_returns_protocol_errors() {
    // GIVEN: Several bad inputs
    let array = "[1,2,3]";
    let garbage = "{not json";
    let numeric_cmd = r#"{"cmd":5,"result_id":"r","error_id":"","payload":null}"#;

    // WHEN / THEN: Each maps to its own variant
    assert!(matches!(
        Envelope::parse(array),
        Err(ProtocolError::NotAnObject { found: "array", .. })
    ));
    assert!(matches!(
        Envelope::parse(garbage),
        Err(ProtocolError::MalformedJson { .. })
    ));
    assert!(matches!(
        Envelope::parse(numeric_cmd),
        Err(ProtocolError::InvalidField { field: "cmd", .. })
    ));
}

/// **VALUE**: Verifies the two response shapes.
///
/// **WHY THIS MATTERS**: Frontends correlate by whichever id slot is populated.
/// Populating both or neither would make a response unroutable.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `failure` writes the id into `result_id`
/// - The error payload loses its `message` key
#[test]
fn given_success_and_failure_when_constructing_then_exactly_one_id_is_set() {
    // GIVEN / WHEN: One response of each kind
    let ok = Envelope::success("get_text", "r1", json!("hello"));
    let err = Envelope::failure("get_text", "e1", "clipboard unavailable");

    // THEN: Slots are exclusive and payloads match
    assert_eq!(ok.result_id, "r1");
    assert_eq!(ok.error_id, "");
    assert!(!ok.is_failure());
    assert_eq!(err.result_id, "");
    assert_eq!(err.error_id, "e1");
    assert!(err.is_failure());
    assert_eq!(err.payload, json!({"message": "clipboard unavailable"}));
}

/// **VALUE**: Verifies decoding of error payloads from the rendering process.
///
/// **WHY THIS MATTERS**: Some native handlers reply with a bare string rather
/// than `{"message": ...}`. Both must produce a readable error.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - A bare string error is rendered with quotes or lost
#[test]
fn given_various_error_payloads_when_decoding_then_extracts_message() {
    // GIVEN: Object, string and numeric payloads
    let object = json!({"message": "boom"});
    let string = json!("bare");
    let number = json!(42);

    // WHEN / THEN
    assert_eq!(ErrorPayload::from_payload(&object).message, "boom");
    assert_eq!(ErrorPayload::from_payload(&string).message, "bare");
    assert_eq!(ErrorPayload::from_payload(&number).message, "42");
}
