use crate::helpers::{FakeBehavior, FakeProcess};

use host_core::native::process::{EscalationPolicy, TerminationOutcome, terminate_process_safely};

use models::{NativeLaunch, NativeLaunchBuilder};

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn short_policy() -> EscalationPolicy {
    EscalationPolicy {
        grace: Duration::from_millis(50),
        terminate: Duration::from_millis(50),
        kill_confirm: Duration::from_millis(50),
    }
}

fn launch() -> NativeLaunch {
    NativeLaunchBuilder::default()
        .with_binary("fake-native")
        .with_config_json("{}")
        .with_host("127.0.0.1")
        .with_port(9000)
        .with_channel_name("escalation_test")
        .with_shutdown_signal(std::env::temp_dir().join("escalation-test-never-set.shutdown"))
        .build()
        .unwrap()
}

fn fake(behavior: FakeBehavior) -> (FakeProcess, Arc<Mutex<Vec<&'static str>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    (
        FakeProcess::from_launch(&launch(), behavior, Arc::clone(&calls)),
        calls,
    )
}

const STUBBORN: FakeBehavior = FakeBehavior {
    exits_on_signal: false,
    honors_terminate: false,
    honors_kill: true,
};

/// **VALUE**: Verifies that a process which already exited is left alone.
///
/// **WHY THIS MATTERS**: The normal shutdown path is the rendering process
/// closing itself. Sending it signals afterwards could hit a reused pid.
///
/// **BUG THIS CATCHES**: Would catch if terminate or kill were issued to a
/// process that exited during the grace period.
#[tokio::test]
async fn given_exited_process_when_terminating_then_no_signals_sent() {
    // GIVEN: A process that has already exited
    let (mut process, calls) = fake(STUBBORN);
    process.exit_handle().store(true, Ordering::Release);

    // WHEN: Stopping it
    let outcome = terminate_process_safely(&mut process, &short_policy()).await;

    // THEN: It is reported as exited with no escalation
    assert_eq!(outcome.unwrap(), TerminationOutcome::Exited);
    assert!(calls.lock().unwrap().is_empty());
}

/// **VALUE**: Verifies the second escalation step.
///
/// **WHY THIS MATTERS**: A process that honors a polite termination request
/// should never be force-killed.
///
/// **BUG THIS CATCHES**: Would catch if kill followed terminate unconditionally.
#[tokio::test]
async fn given_process_honoring_terminate_when_terminating_then_not_killed() {
    // GIVEN: A process that exits on a termination request
    let (mut process, calls) = fake(FakeBehavior {
        honors_terminate: true,
        ..STUBBORN
    });

    // WHEN: Stopping it
    let outcome = terminate_process_safely(&mut process, &short_policy()).await;

    // THEN: It stops at the terminate step
    assert_eq!(outcome.unwrap(), TerminationOutcome::Terminated);
    assert_eq!(*calls.lock().unwrap(), vec!["terminate"]);
}

/// **VALUE**: Verifies the final escalation step.
///
/// **WHY THIS MATTERS**: A hung rendering process must not keep the host alive.
///
/// **BUG THIS CATCHES**: Would catch if the kill step were skipped or issued
/// before the termination request.
#[tokio::test]
async fn given_process_ignoring_terminate_when_terminating_then_killed() {
    // GIVEN: A process that ignores termination requests
    let (mut process, calls) = fake(STUBBORN);

    // WHEN: Stopping it
    let outcome = terminate_process_safely(&mut process, &short_policy()).await;

    // THEN: It is killed after the termination request
    assert_eq!(outcome.unwrap(), TerminationOutcome::Killed);
    assert_eq!(*calls.lock().unwrap(), vec!["terminate", "kill"]);
}

/// **VALUE**: Verifies that an unkillable process is reported.
///
/// **WHY THIS MATTERS**: The session must say it could not confirm the process
/// died instead of claiming a clean stop.
///
/// **BUG THIS CATCHES**: Would catch if the last step returned Ok without
/// observing the exit.
#[tokio::test]
async fn given_unkillable_process_when_terminating_then_error_returned() {
    // GIVEN: A process that ignores every request
    let (mut process, calls) = fake(FakeBehavior {
        honors_kill: false,
        ..STUBBORN
    });

    // WHEN: Stopping it
    let outcome = terminate_process_safely(&mut process, &short_policy()).await;

    // THEN: Escalation ran to the end and failed
    let err = outcome.unwrap_err();
    assert!(err.to_string().contains("still alive"));
    assert_eq!(*calls.lock().unwrap(), vec!["terminate", "kill"]);
}
