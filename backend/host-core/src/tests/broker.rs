use crate::broker::{Broker, Resolution};
use crate::error::broker::BrokerError;

use common::ErrorLocation;

use models::Envelope;

use std::panic::Location;
use std::time::Duration;

use serde_json::json;
use tokio::sync::oneshot;

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// **VALUE**: Verifies that concurrent calls resolve to their own responses
/// when responses arrive in reverse order.
///
/// **WHY THIS MATTERS**: The rendering process answers in whatever order its work
/// completes. Matching must be purely by id.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Responses are matched FIFO instead of by id
/// - Two calls share an id pair
#[tokio::test]
async fn given_two_calls_when_responses_arrive_reversed_then_each_gets_its_own() {
    // GIVEN: A broker and its outbound queue
    let broker = Broker::new(TEST_TIMEOUT);
    let mut outbound = broker.take_outbound().unwrap();

    // WHEN: Two calls are in flight and answered in reverse order
    let first = broker.call::<String>("echo", ["one"], None);
    let second = broker.call::<String>("echo", ["two"], None);
    let responder = async {
        let r1 = outbound.recv().await.unwrap();
        let r2 = outbound.recv().await.unwrap();
        assert_ne!(r1.result_id, r2.result_id);
        for request in [r2, r1] {
            let echoed = request.payload[0].clone();
            broker.resolve(Envelope::success(request.cmd, request.result_id, echoed));
        }
    };
    let (first, second, ()) = tokio::join!(first, second, responder);

    // THEN: Each call receives the value sent for its own id
    assert_eq!(first.unwrap(), "one");
    assert_eq!(second.unwrap(), "two");
    assert_eq!(broker.pending_count(), 0);
}

/// **VALUE**: Verifies at-most-once resolution.
///
/// **WHY THIS MATTERS**: A duplicated response (retry on the native side, or a
/// success followed by an error for the same call) must not wake anything twice.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The pending entry is not removed on first resolution
/// - A late error_id response is matched after a result_id response
#[tokio::test]
async fn given_resolved_call_when_resolving_again_then_second_is_unmatched() {
    // GIVEN: One call in flight
    let broker = Broker::new(TEST_TIMEOUT);
    let mut outbound = broker.take_outbound().unwrap();
    let call = broker.call::<u32>("count", (), None);

    let responder = async {
        let request = outbound.recv().await.unwrap();
        let first = broker.resolve(Envelope::success("count", &request.result_id, json!(7)));
        let again = broker.resolve(Envelope::success("count", &request.result_id, json!(8)));
        let late_error = broker.resolve(Envelope::failure("count", &request.error_id, "late"));
        (first, again, late_error)
    };

    // WHEN: Resolving three times
    let (value, (first, again, late_error)) = tokio::join!(call, responder);

    // THEN: Only the first counts
    assert_eq!(value.unwrap(), 7);
    assert_eq!(first, Resolution::Resolved);
    assert_eq!(again, Resolution::Unmatched);
    assert_eq!(late_error, Resolution::Unmatched);
}

/// **VALUE**: Verifies that an error response rejects the call with the remote message.
///
/// **WHY THIS MATTERS**: Native failures must reach the caller as errors, not as
/// values that happen to fail decoding.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - error_id is not indexed
/// - The remote message is lost
#[tokio::test]
async fn given_error_response_when_awaiting_then_call_is_rejected() {
    // GIVEN: One call in flight
    let broker = Broker::new(TEST_TIMEOUT);
    let mut outbound = broker.take_outbound().unwrap();
    let call = broker.call::<String>("clipboard.get_text", (), None);

    let responder = async {
        let request = outbound.recv().await.unwrap();
        broker.resolve(Envelope::failure(request.cmd, request.error_id, "no clipboard"));
    };

    // WHEN: The native side answers with an error
    let (result, ()) = tokio::join!(call, responder);

    // THEN: Remote error carrying the message
    match result.unwrap_err() {
        BrokerError::Remote { message, .. } => assert!(message.contains("no clipboard")),
        other => panic!("unexpected error: {other}"),
    }
}

/// **VALUE**: Verifies timeout handling.
///
/// **WHY THIS MATTERS**: A rendering process that never answers must not leave
/// callers hanging or pending entries leaking.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The timeout is ignored
/// - The pending entry survives the timeout
#[tokio::test]
async fn given_no_response_when_timeout_elapses_then_returns_timeout_and_cleans_up() {
    // GIVEN: A call with a short timeout and nobody answering
    let broker = Broker::new(TEST_TIMEOUT);
    let _outbound = broker.take_outbound().unwrap();

    // WHEN: Awaiting it
    let result = broker
        .call::<String>("slow", (), Some(Duration::from_millis(20)))
        .await;

    // THEN: Timeout error, nothing pending
    assert!(matches!(result, Err(BrokerError::Timeout { .. })));
    assert_eq!(broker.pending_count(), 0);
}

/// **VALUE**: Verifies caller cancellation.
///
/// **WHY THIS MATTERS**: Dropping a call future (e.g. the frontend handler was
/// cancelled) must discard local state only.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The drop guard is removed
/// - A late response after cancellation panics or resolves something else
#[tokio::test]
async fn given_dropped_call_when_response_arrives_then_it_is_unmatched() {
    // GIVEN: A call that is sent and then dropped
    let broker = Broker::new(TEST_TIMEOUT);
    let mut outbound = broker.take_outbound().unwrap();
    let call = broker.call::<String>("drop_me", (), None);

    // WHEN: Polling it just long enough to send, then dropping it
    let _ = tokio::time::timeout(Duration::from_millis(20), call).await;
    let request = outbound.recv().await.unwrap();

    // THEN: Nothing pending, and the late response is ignored
    assert_eq!(broker.pending_count(), 0);
    let late = broker.resolve(Envelope::success("drop_me", request.result_id, json!("x")));
    assert_eq!(late, Resolution::Unmatched);
}

/// **VALUE**: Verifies that shutdown rejects every pending call and refuses new ones.
///
/// **WHY THIS MATTERS**: During teardown no caller may stay suspended forever on a
/// response that will never come.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `cancel_all` forgets pending entries
/// - Calls issued after shutdown are still queued
#[tokio::test]
async fn given_pending_calls_when_cancel_all_then_all_rejected_with_shutdown() {
    // GIVEN: Two calls in flight
    let broker = Broker::new(TEST_TIMEOUT);
    let mut outbound = broker.take_outbound().unwrap();
    let a = broker.call::<String>("a", (), None);
    let b = broker.call::<String>("b", (), None);

    let canceller = async {
        outbound.recv().await.unwrap();
        outbound.recv().await.unwrap();
        broker.cancel_all()
    };

    // WHEN: Cancelling everything
    let (a, b, cancelled) = tokio::join!(a, b, canceller);
    let after = broker.call::<String>("c", (), None).await;

    // THEN: Both rejected, later call refused
    assert_eq!(cancelled, 2);
    assert!(matches!(a, Err(BrokerError::Shutdown { .. })));
    assert!(matches!(b, Err(BrokerError::Shutdown { .. })));
    assert!(matches!(after, Err(BrokerError::Shutdown { .. })));
}

/// **VALUE**: Verifies that registration itself refuses work once the broker
/// is closed.
///
/// **WHY THIS MATTERS**: A call can pass its first checks just as shutdown
/// drains the table. If registration does not look at the flag under the
/// table lock, that call is inserted after the drain and waits out its full
/// timeout.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The closed flag is only checked before taking the table lock
/// - A refused registration still leaves an entry behind
#[tokio::test]
async fn given_closed_broker_when_registering_pending_then_refused_and_table_empty() {
    // GIVEN: A broker that has been shut down
    let broker = Broker::new(TEST_TIMEOUT);
    broker.cancel_all();
    let (waiter, _receiver) = oneshot::channel();

    // WHEN: Registering directly, as a racing call would
    let result = broker.register_pending(
        "late",
        waiter,
        "String",
        ErrorLocation::from(Location::caller()),
    );

    // THEN: Refused with Shutdown and nothing is tracked
    assert!(matches!(result, Err(BrokerError::Shutdown { .. })));
    assert_eq!(broker.pending_count(), 0);
}

/// **VALUE**: Verifies that rejecting pending calls leaves the broker open.
///
/// **WHY THIS MATTERS**: Losing the native link fails the calls already sent
/// but is not a shutdown; the orchestrator decides what happens next.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `reject_pending` sets the closed flag
/// - Rejected callers hang instead of seeing the reason
#[tokio::test]
async fn given_pending_call_when_rejecting_pending_then_caller_sees_reason() {
    // GIVEN: One call in flight
    let broker = Broker::new(TEST_TIMEOUT);
    let mut outbound = broker.take_outbound().unwrap();
    let call = broker.call::<String>("render", (), None);

    let rejecter = async {
        outbound.recv().await.unwrap();
        broker.reject_pending("lost: link closed")
    };

    // WHEN: Rejecting everything outstanding
    let (result, rejected) = tokio::join!(call, rejecter);

    // THEN: The caller gets the reason and the broker still accepts work
    assert_eq!(rejected, 1);
    let err = result.unwrap_err();
    assert!(matches!(err, BrokerError::Shutdown { .. }));
    assert!(err.to_string().contains("lost: link closed"));
    assert!(!broker.is_closed());
    assert_eq!(broker.pending_count(), 0);
}

/// **VALUE**: Verifies argument normalization on outgoing requests.
///
/// **WHY THIS MATTERS**: The rendering process always reads positional arguments
/// from an array.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - A unit call sends `null` instead of `[]`
/// - A scalar argument is sent unwrapped
#[tokio::test]
async fn given_various_args_when_calling_then_payload_is_always_an_array() {
    // GIVEN: A broker whose calls time out immediately
    let broker = Broker::new(Duration::from_millis(10));
    let mut outbound = broker.take_outbound().unwrap();

    // WHEN: Calling with unit, a scalar and a tuple
    let _ = broker.call::<()>("none", (), None).await;
    let _ = broker.call::<()>("scalar", true, None).await;
    let _ = broker.call::<()>("tuple", (1, "x"), None).await;

    // THEN: Each request payload is an array
    assert_eq!(outbound.recv().await.unwrap().payload, json!([]));
    assert_eq!(outbound.recv().await.unwrap().payload, json!([true]));
    assert_eq!(outbound.recv().await.unwrap().payload, json!([1, "x"]));
}
