use crate::helpers::{
    connect, link_fake_native, receive_envelope, request, send_json, start_relay,
};

use host_core::api::{ClipboardApi, WindowApi, register_builtin_commands};
use host_core::broker::Broker;
use host_core::registry::CommandRegistry;

use std::time::Duration;

use serde_json::json;

/// **VALUE**: Verifies a native-backed command end to end.
///
/// **WHY THIS MATTERS**: This is the path every clipboard, window, and
/// devtools command takes: relay, dispatcher, handler, broker, native link,
/// and back.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Handler arguments were not forwarded as a one-element array
/// - The native reply was not routed back to the frontend's result_id
#[tokio::test]
async fn given_fake_native_when_setting_then_getting_text_then_text_round_trips() {
    // GIVEN: Built-in commands backed by a fake rendering process
    let broker = Broker::new(Duration::from_secs(5));
    link_fake_native(&broker);
    let mut registry = CommandRegistry::default();
    register_builtin_commands(&mut registry, &broker).unwrap();
    let relay = start_relay(registry).await;
    let mut ws = connect(relay.addr).await;

    // WHEN: Setting then reading the clipboard
    send_json(&mut ws, request("set_text", "r1", json!(["hello"]))).await;
    let set = receive_envelope(&mut ws).await;
    send_json(&mut ws, request("get_text", "r2", json!([]))).await;
    let got = receive_envelope(&mut ws).await;

    // THEN: Both succeed and the text comes back
    assert_eq!(set.result_id, "r1");
    assert_eq!(set.payload, json!(null));
    assert_eq!(got.result_id, "r2");
    assert_eq!(got.payload, json!("hello"));

    relay.tasks.cancel_all().await;
}

/// **VALUE**: Verifies that concurrent host calls are matched by id.
///
/// **WHY THIS MATTERS**: Several frontend requests can be in flight against
/// the rendering process at once. Each caller must get its own answer.
///
/// **BUG THIS CATCHES**: Would catch if responses were delivered in send
/// order instead of by result_id.
#[tokio::test]
async fn given_concurrent_calls_when_native_answers_then_each_caller_gets_its_value() {
    // GIVEN: Facades over a broker linked to the fake rendering process
    let broker = Broker::new(Duration::from_secs(5));
    link_fake_native(&broker);
    let clipboard = ClipboardApi::new(broker.clone());
    let window = WindowApi::new(broker.clone());
    clipboard.set_text("from clipboard").await.unwrap();
    window.set_title("from window").await.unwrap();

    // WHEN: Both reads are in flight together
    let (text, title) = tokio::join!(clipboard.get_text(), window.get_title());

    // THEN: Each caller receives its own value
    assert_eq!(text.unwrap(), "from clipboard");
    assert_eq!(title.unwrap(), "from window");
    assert_eq!(broker.pending_count(), 0);
}

/// **VALUE**: Verifies that a native-side failure reaches the frontend.
///
/// **WHY THIS MATTERS**: The page needs the rendering process's message to
/// explain why, for example, image clipboard access failed.
///
/// **BUG THIS CATCHES**: Would catch if remote errors were swallowed or
/// reported under the result id.
#[tokio::test]
async fn given_native_rejects_when_command_sent_then_frontend_gets_error_id() {
    // GIVEN: A fake rendering process that does not implement image access
    let broker = Broker::new(Duration::from_secs(5));
    link_fake_native(&broker);
    let mut registry = CommandRegistry::default();
    register_builtin_commands(&mut registry, &broker).unwrap();
    let relay = start_relay(registry).await;
    let mut ws = connect(relay.addr).await;

    // WHEN: Requesting the clipboard image
    send_json(&mut ws, request("get_image", "r5", json!([]))).await;

    // THEN: The failure is tagged with the error id and keeps the message
    let response = receive_envelope(&mut ws).await;
    assert!(response.is_failure());
    assert_eq!(response.error_id, "r5-err");
    assert_eq!(
        response.payload,
        json!({
            "message": "'clipboard.get_image' failed: unsupported method clipboard.get_image"
        })
    );

    relay.tasks.cancel_all().await;
}
