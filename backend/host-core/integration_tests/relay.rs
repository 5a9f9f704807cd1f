use crate::helpers::{
    connect, receive_envelope, request, send_json, send_raw, start_relay, wait_for_clients,
};

use host_core::api::register_builtin_commands;
use host_core::broker::Broker;
use host_core::error::handler::HandlerError;
use host_core::registry::CommandRegistry;

use std::time::Duration;

use futures_util::SinkExt;
use serde_json::json;

fn echo_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::default();
    registry
        .register_sync("echo", |text: String| Ok::<_, HandlerError>(text))
        .unwrap()
        .register_sync("fail", |(): ()| {
            Err::<(), _>(HandlerError::failed("nothing to do"))
        })
        .unwrap();
    registry
}

/// **VALUE**: Verifies the full request path for a host-local command.
///
/// **WHY THIS MATTERS**: `home_dir` is answered without the rendering process.
/// If the relay, dispatcher, or coercion of `{}` breaks, the simplest command
/// in the API stops working.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - An empty object payload is not accepted for a no-argument command
/// - The response is not tagged with the request's result_id
#[tokio::test]
async fn given_home_dir_request_when_sent_then_result_id_carries_directory() {
    // GIVEN: A relay with the built-in commands
    let broker = Broker::new(Duration::from_secs(1));
    let mut registry = CommandRegistry::default();
    register_builtin_commands(&mut registry, &broker).unwrap();
    let relay = start_relay(registry).await;
    let mut ws = connect(relay.addr).await;

    // WHEN: Asking for the home directory with an empty object payload
    send_json(
        &mut ws,
        json!({"cmd": "home_dir", "result_id": "r1", "error_id": "", "payload": {}}),
    )
    .await;

    // THEN: The response carries r1 and the directory string
    let response = receive_envelope(&mut ws).await;
    assert_eq!(response.cmd, "home_dir");
    assert_eq!(response.result_id, "r1");
    let expected = dirs::home_dir().unwrap().to_string_lossy().into_owned();
    assert_eq!(response.payload, json!(expected));

    relay.tasks.cancel_all().await;
}

/// **VALUE**: Verifies that responses are broadcast to every connected client.
///
/// **WHY THIS MATTERS**: Frontends correlate by id, not by connection. A page
/// with two sockets expects to see the answer on both.
///
/// **BUG THIS CATCHES**: Would catch if the relay only replied to the sender.
#[tokio::test]
async fn given_two_clients_when_one_sends_then_both_receive_response() {
    // GIVEN: Two connected clients
    let relay = start_relay(echo_registry()).await;
    let mut sender = connect(relay.addr).await;
    let mut observer = connect(relay.addr).await;
    wait_for_clients(&relay.clients, 2).await;

    // WHEN: One client sends a request
    send_json(&mut sender, request("echo", "r7", json!(["hi"]))).await;

    // THEN: Both receive the same response
    for ws in [&mut sender, &mut observer] {
        let response = receive_envelope(ws).await;
        assert_eq!(response.result_id, "r7");
        assert_eq!(response.payload, json!("hi"));
    }

    relay.tasks.cancel_all().await;
}

/// **VALUE**: Verifies that a vanished client does not stall the broadcast.
///
/// **WHY THIS MATTERS**: Pages reload and tabs close at any time. The
/// remaining clients must keep getting responses.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - A failed send to one client aborted delivery to the rest
/// - Closed clients were never removed from the set
#[tokio::test]
async fn given_disconnected_client_when_broadcasting_then_others_still_receive() {
    // GIVEN: Two clients, one of which leaves
    let relay = start_relay(echo_registry()).await;
    let mut stayer = connect(relay.addr).await;
    let mut leaver = connect(relay.addr).await;
    wait_for_clients(&relay.clients, 2).await;

    leaver.close(None).await.unwrap();
    drop(leaver);
    wait_for_clients(&relay.clients, 1).await;

    // WHEN: The remaining client sends a request
    send_json(&mut stayer, request("echo", "r2", json!("still here"))).await;

    // THEN: It receives its response
    let response = receive_envelope(&mut stayer).await;
    assert_eq!(response.result_id, "r2");
    assert_eq!(response.payload, json!("still here"));

    relay.tasks.cancel_all().await;
}

/// **VALUE**: Verifies that bad input is dropped without closing the socket.
///
/// **WHY THIS MATTERS**: A single malformed frame from a page must not cut
/// the page off from every later response.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Malformed JSON or unknown commands produced a reply
/// - Either closed the connection
#[tokio::test]
async fn given_malformed_and_unknown_messages_when_sent_then_connection_stays_usable() {
    // GIVEN: A connected client
    let relay = start_relay(echo_registry()).await;
    let mut ws = connect(relay.addr).await;

    // WHEN: Sending garbage, an envelope with extra keys, and an unknown command
    send_raw(&mut ws, "{not json").await;
    send_json(
        &mut ws,
        json!({"cmd": "echo", "result_id": "x", "error_id": "y", "payload": [], "extra": 1}),
    )
    .await;
    send_json(&mut ws, request("no_such_command", "r0", json!([]))).await;
    send_json(&mut ws, request("echo", "r3", json!(["ok"]))).await;

    // THEN: The only response is for the valid request
    let response = receive_envelope(&mut ws).await;
    assert_eq!(response.result_id, "r3");
    assert_eq!(response.payload, json!("ok"));

    relay.tasks.cancel_all().await;
}

/// **VALUE**: Verifies that handler failures come back on the error id.
///
/// **WHY THIS MATTERS**: The page rejects its pending promise only when it
/// sees the error_id it generated.
///
/// **BUG THIS CATCHES**: Would catch if failures were tagged with result_id
/// or carried the decorated error text instead of the plain message.
#[tokio::test]
async fn given_failing_command_when_sent_then_error_id_carries_message() {
    // GIVEN: A connected client
    let relay = start_relay(echo_registry()).await;
    let mut ws = connect(relay.addr).await;

    // WHEN: Calling a command whose handler fails
    send_json(&mut ws, request("fail", "r4", json!([]))).await;

    // THEN: The response is tagged with the error id
    let response = receive_envelope(&mut ws).await;
    assert_eq!(response.result_id, "");
    assert_eq!(response.error_id, "r4-err");
    assert_eq!(response.payload, json!({"message": "nothing to do"}));

    relay.tasks.cancel_all().await;
}

/// **VALUE**: Verifies that a handler panic is answered and the socket survives.
///
/// **WHY THIS MATTERS**: A panic inside one command used to end the reading
/// task, silently dropping the page's connection and every pending request
/// on it.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The panic unwinds into the connection task
/// - The client is removed from the broadcast set
/// - No error envelope reaches the caller
#[tokio::test]
async fn given_panicking_command_when_sent_then_error_returned_and_connection_kept() {
    // GIVEN: A relay with a handler that panics
    let mut registry = echo_registry();
    registry
        .register_sync("boom", |(): ()| -> Result<(), HandlerError> {
            panic!("handler blew up")
        })
        .unwrap();
    let relay = start_relay(registry).await;
    let mut ws = connect(relay.addr).await;
    wait_for_clients(&relay.clients, 1).await;

    // WHEN: Calling it
    send_json(&mut ws, request("boom", "r9", json!([]))).await;

    // THEN: The failure comes back on the error id
    let response = receive_envelope(&mut ws).await;
    assert_eq!(response.cmd, "boom");
    assert_eq!(response.result_id, "");
    assert_eq!(response.error_id, "r9-err");
    assert_eq!(response.payload, json!({"message": "handler panicked"}));

    // THEN: The same connection keeps working
    send_json(&mut ws, request("echo", "r10", json!(["still here"]))).await;
    let response = receive_envelope(&mut ws).await;
    assert_eq!(response.result_id, "r10");
    assert_eq!(response.payload, json!("still here"));
    assert_eq!(relay.clients.len().await, 1);

    relay.tasks.cancel_all().await;
}
