use crate::helpers::{FakeBehavior, FakeProcess, connect, wait_for_clients};

use host_core::broker::Broker;
use host_core::config::HostConfig;
use host_core::error::orchestrator::OrchestratorError;
use host_core::error::spawn::SpawnError;
use host_core::native::process::EscalationPolicy;
use host_core::registry::CommandRegistry;
use host_core::runtime::{LifecycleState, Orchestrator};

use common::ErrorLocation;
use models::NativeLaunch;

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

const SESSION_LIMIT: Duration = Duration::from_secs(10);

const COOPERATIVE: FakeBehavior = FakeBehavior {
    exits_on_signal: true,
    honors_terminate: true,
    honors_kill: true,
};

/// Test helper: An orchestrator on an ephemeral port with a fake binary name.
fn orchestrator(channel_name: &str) -> Orchestrator {
    let mut config = HostConfig::default();
    config.server.port = 0;
    config.native.binary = Some("fake-native".into());
    config.native.channel_name = channel_name.to_string();

    Orchestrator::new(
        config,
        Arc::new(CommandRegistry::default()),
        Broker::new(Duration::from_secs(1)),
    )
    .with_policy(EscalationPolicy {
        grace: Duration::from_millis(100),
        terminate: Duration::from_millis(100),
        kill_confirm: Duration::from_millis(100),
    })
}

async fn wait_until_running(orchestrator: &Orchestrator) {
    let mut states = orchestrator.context().subscribe();
    states
        .wait_for(|state| *state == LifecycleState::Running)
        .await
        .unwrap();
}

/// **VALUE**: Verifies the normal session lifecycle.
///
/// **WHY THIS MATTERS**: A shutdown request is how both Ctrl-C and the page's
/// close button end a session. The rendering process sees the signal file and
/// exits on its own.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The session never observed the signal
/// - The signal file outlived the session
/// - Background tasks kept running after Terminated
#[tokio::test]
async fn given_running_session_when_shutdown_requested_then_terminated() {
    // GIVEN: A running session with a cooperative process
    let orchestrator = orchestrator("orchestrator_test_shutdown");
    let calls = Arc::new(Mutex::new(Vec::new()));
    let spawn_calls = Arc::clone(&calls);

    // WHEN: Requesting shutdown once Running
    let (result, ()) = timeout(SESSION_LIMIT, async {
        tokio::join!(
            orchestrator.run_with(|launch: &NativeLaunch| {
                Ok::<_, SpawnError>(FakeProcess::from_launch(launch, COOPERATIVE, spawn_calls))
            }),
            async {
                wait_until_running(&orchestrator).await;
                assert!(orchestrator.context().request_shutdown().unwrap());
            }
        )
    })
    .await
    .expect("session did not end");

    // THEN: The session ended cleanly without escalation
    result.unwrap();
    let ctx = orchestrator.context();
    assert_eq!(ctx.state(), LifecycleState::Terminated);
    assert!(!ctx.shutdown_signal().path().exists());
    assert!(ctx.tasks().is_empty());
    assert!(calls.lock().unwrap().is_empty());
}

/// **VALUE**: Verifies that ending a session closes every open page connection.
///
/// **WHY THIS MATTERS**: A page left connected after Terminated keeps writing
/// into a relay that no longer exists, and the client set reports ghosts.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - A connection's writer outlives the task group
/// - Drain leaves entries in the client set
/// - The socket stays open after the session ends
#[tokio::test]
async fn given_connected_page_when_shutdown_requested_then_connection_closed() {
    // GIVEN: A running session with one page connected
    let orchestrator = orchestrator("orchestrator_test_drain_clients");
    let calls = Arc::new(Mutex::new(Vec::new()));
    let relay_port = Arc::new(Mutex::new(None));
    let launch_port = Arc::clone(&relay_port);

    // WHEN: Requesting shutdown while the page is still attached
    let (result, mut ws) = timeout(SESSION_LIMIT, async {
        tokio::join!(
            orchestrator.run_with(|launch: &NativeLaunch| {
                *launch_port.lock().unwrap() = Some(launch.port());
                Ok::<_, SpawnError>(FakeProcess::from_launch(launch, COOPERATIVE, calls))
            }),
            async {
                wait_until_running(&orchestrator).await;
                let port = relay_port.lock().unwrap().expect("relay port not recorded");
                let ws = connect(SocketAddr::from(([127, 0, 0, 1], port))).await;
                wait_for_clients(orchestrator.context().clients(), 1).await;
                orchestrator.context().request_shutdown().unwrap();
                ws
            }
        )
    })
    .await
    .expect("session did not end");

    // THEN: No client is tracked and the page sees its connection end
    result.unwrap();
    assert_eq!(orchestrator.context().state(), LifecycleState::Terminated);
    assert_eq!(orchestrator.context().clients().len().await, 0);

    let next = timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("connection stayed open after Terminated");
    assert!(
        matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))),
        "unexpected frame after shutdown: {next:?}"
    );
}

/// **VALUE**: Verifies that shutdown escalates against a hung process.
///
/// **WHY THIS MATTERS**: A rendering process stuck in its event loop must
/// not keep the host running forever.
///
/// **BUG THIS CATCHES**: Would catch if the orchestrator waited on the
/// process indefinitely or skipped the termination request.
#[tokio::test]
async fn given_process_ignoring_signals_when_shutdown_requested_then_killed() {
    // GIVEN: A running session whose process ignores the signal and terminate
    let orchestrator = orchestrator("orchestrator_test_kill");
    let calls = Arc::new(Mutex::new(Vec::new()));
    let spawn_calls = Arc::clone(&calls);
    let behavior = FakeBehavior {
        exits_on_signal: false,
        honors_terminate: false,
        honors_kill: true,
    };

    // WHEN: Requesting shutdown once Running
    let (result, ()) = timeout(SESSION_LIMIT, async {
        tokio::join!(
            orchestrator.run_with(|launch: &NativeLaunch| {
                Ok::<_, SpawnError>(FakeProcess::from_launch(launch, behavior, spawn_calls))
            }),
            async {
                wait_until_running(&orchestrator).await;
                orchestrator.context().request_shutdown().unwrap();
            }
        )
    })
    .await
    .expect("session did not end");

    // THEN: The process was asked to terminate, then killed
    result.unwrap();
    assert_eq!(orchestrator.context().state(), LifecycleState::Terminated);
    assert_eq!(*calls.lock().unwrap(), vec!["terminate", "kill"]);
}

/// **VALUE**: Verifies that a failed spawn still ends the session.
///
/// **WHY THIS MATTERS**: A missing binary must surface as an error, not leave
/// the relay listening with nothing behind it.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The spawn error were swallowed
/// - The relay task were left running
/// - The session stayed in Starting
#[tokio::test]
async fn given_spawn_failure_when_running_then_error_and_terminated() {
    // GIVEN: A spawner that always fails
    let orchestrator = orchestrator("orchestrator_test_spawn_failure");

    // WHEN: Running the session
    let result = timeout(
        SESSION_LIMIT,
        orchestrator.run_with(|_: &NativeLaunch| {
            Err::<FakeProcess, _>(SpawnError::Validation {
                message: String::from("no such binary"),
                location: ErrorLocation::from(Location::caller()),
            })
        }),
    )
    .await
    .expect("session did not end");

    // THEN: The spawn error is returned and the session is over
    assert!(matches!(result, Err(OrchestratorError::Spawn(_))));
    let ctx = orchestrator.context();
    assert_eq!(ctx.state(), LifecycleState::Terminated);
    assert!(ctx.tasks().is_empty());
}

/// **VALUE**: Verifies that the process exiting on its own ends the session.
///
/// **WHY THIS MATTERS**: Closing the window exits the rendering process
/// without any frontend asking the host to stop.
///
/// **BUG THIS CATCHES**: Would catch if the orchestrator only watched the
/// signal file and hung after the process was gone.
#[tokio::test]
async fn given_process_exits_without_signal_when_running_then_session_ends() {
    // GIVEN: A running session
    let orchestrator = orchestrator("orchestrator_test_process_exit");
    let calls = Arc::new(Mutex::new(Vec::new()));
    let spawn_calls = Arc::clone(&calls);
    let exited = Arc::new(Mutex::new(None));
    let exit_slot = Arc::clone(&exited);

    // WHEN: The process exits by itself
    let (result, ()) = timeout(SESSION_LIMIT, async {
        tokio::join!(
            orchestrator.run_with(move |launch: &NativeLaunch| {
                let process = FakeProcess::from_launch(launch, COOPERATIVE, spawn_calls);
                *exit_slot.lock().unwrap() = Some(process.exit_handle());
                Ok::<_, SpawnError>(process)
            }),
            async {
                wait_until_running(&orchestrator).await;
                let handle = exited.lock().unwrap().clone().unwrap();
                handle.store(true, Ordering::Release);
            }
        )
    })
    .await
    .expect("session did not end");

    // THEN: The session terminated without escalation
    result.unwrap();
    assert_eq!(orchestrator.context().state(), LifecycleState::Terminated);
    assert!(calls.lock().unwrap().is_empty());
}

/// **VALUE**: Verifies that a session runs once.
///
/// **WHY THIS MATTERS**: The session id and signal path belong to one run.
/// Reusing them would let a stale signal file stop the next process at once.
///
/// **BUG THIS CATCHES**: Would catch if run_with accepted a Terminated session.
#[tokio::test]
async fn given_terminated_session_when_run_again_then_lifecycle_error() {
    // GIVEN: A session that already failed to start
    let orchestrator = orchestrator("orchestrator_test_rerun");
    let fail = |_: &NativeLaunch| {
        Err::<FakeProcess, _>(SpawnError::Validation {
            message: String::from("no such binary"),
            location: ErrorLocation::from(Location::caller()),
        })
    };
    let _ = orchestrator.run_with(fail).await;

    // WHEN: Running it again
    let result = orchestrator.run_with(fail).await;

    // THEN: It is refused
    assert!(matches!(result, Err(OrchestratorError::Lifecycle { .. })));
}
