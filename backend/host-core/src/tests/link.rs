use crate::broker::Broker;
use crate::error::broker::BrokerError;
use crate::native::link::{run_link, socket_path};

use models::Envelope;

use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};

/// **VALUE**: Verifies one request/response round trip over the line protocol.
///
/// **WHY THIS MATTERS**: Every host-issued call crosses this link. Framing
/// mistakes (missing newline, partial writes) would hang every caller.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Requests are not newline-terminated
/// - Inbound lines are not fed to the broker
/// - Malformed lines abort the link instead of being skipped
#[tokio::test]
async fn given_link_when_native_answers_then_call_resolves() {
    // GIVEN: A broker linked to an in-memory peer
    let broker = Broker::new(Duration::from_secs(5));
    let outbound = broker.take_outbound().unwrap();
    let (host_side, native_side) = duplex(4096);
    let link = tokio::spawn(run_link(host_side, broker.clone(), outbound));

    let native = tokio::spawn(async move {
        let (reader, mut writer) = tokio::io::split(native_side);
        let mut lines = BufReader::new(reader).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        let request = Envelope::parse(&line).unwrap();
        let response = Envelope::success(&request.cmd, &request.result_id, json!("pong"));

        writer.write_all(b"this is not json\n").await.unwrap();
        writer
            .write_all(format!("{}\n", response.to_json().unwrap()).as_bytes())
            .await
            .unwrap();
        writer.flush().await.unwrap();
        request
    });

    // WHEN: Calling through the broker
    let reply: String = broker.call("ping", ["x"], None).await.unwrap();

    // THEN: The reply arrives and the request had the expected shape
    assert_eq!(reply, "pong");
    let request = native.await.unwrap();
    assert_eq!(request.cmd, "ping");
    assert_eq!(request.payload, json!(["x"]));
    assert!(!request.result_id.is_empty());
    assert!(!request.error_id.is_empty());
    link.abort();
}

/// **VALUE**: Verifies that the link ends cleanly when the peer hangs up.
///
/// **WHY THIS MATTERS**: The rendering process closing its socket is a normal
/// part of shutdown and must not be reported as a failure.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - EOF is treated as an error
/// - The link spins on a closed stream
#[tokio::test]
async fn given_peer_closes_when_link_running_then_returns_ok() {
    // GIVEN: A running link
    let broker = Broker::new(Duration::from_secs(5));
    let outbound = broker.take_outbound().unwrap();
    let (host_side, native_side) = duplex(1024);
    let link = tokio::spawn(run_link(host_side, broker, outbound));

    // WHEN: The peer drops its end
    drop(native_side);

    // THEN: The link finishes with Ok
    let result = tokio::time::timeout(Duration::from_secs(2), link)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

/// **VALUE**: Verifies that calls already sent fail as soon as the link drops.
///
/// **WHY THIS MATTERS**: Once the socket is gone no response can arrive. A
/// caller must learn that right away instead of waiting out the call timeout.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - In-flight calls stay in the table after the link ends
/// - The rejection races the final outbound write and misses a call
#[tokio::test]
async fn given_call_in_flight_when_peer_closes_then_call_rejected_promptly() {
    // GIVEN: A link whose peer reads one request and hangs up
    let broker = Broker::new(Duration::from_secs(30));
    let outbound = broker.take_outbound().unwrap();
    let (host_side, native_side) = duplex(4096);
    let link = tokio::spawn(run_link(host_side, broker.clone(), outbound));

    let native = tokio::spawn(async move {
        let mut lines = BufReader::new(native_side).lines();
        lines.next_line().await.unwrap().unwrap()
    });

    // WHEN: Calling through the broker
    let result = tokio::time::timeout(
        Duration::from_secs(2),
        broker.call::<String>("render", (), None),
    )
    .await
    .expect("call should fail before its own timeout");

    // THEN: Rejected with the link-closed reason, nothing left pending
    let err = result.unwrap_err();
    assert!(matches!(err, BrokerError::Shutdown { .. }), "got {err:?}");
    assert!(err.to_string().contains("native link closed"));
    assert_eq!(broker.pending_count(), 0);
    assert!(native.await.unwrap().contains("render"));
    assert!(link.await.unwrap().is_ok());
}

/// **VALUE**: Verifies the native socket location.
///
/// **WHY THIS MATTERS**: The rendering process serves the socket at this path;
/// both sides must agree on it.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The extension or directory changes on one side only
#[test]
fn given_channel_name_when_resolving_socket_path_then_uses_temp_dir() {
    // GIVEN / WHEN
    let path = socket_path("frame_host_pipe");

    // THEN
    assert_eq!(path, std::env::temp_dir().join("frame_host_pipe.sock"));
}
