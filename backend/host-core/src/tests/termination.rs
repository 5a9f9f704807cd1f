// Unit tests for process module private functions
// Escalation against a live process double is in integration_tests/native/process.rs

use crate::native::process::{EscalationPolicy, build_spawn_command};

use models::NativeLaunchBuilder;

use std::ffi::OsStr;
use std::time::Duration;

/// **VALUE**: Verifies that the spawn command passes the launch argv positionally.
///
/// **WHY THIS MATTERS**: The rendering process reads `(config, host, port,
/// channel_name, shutdown_signal)` by position. Flags or reordering break it.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The command is built with extra flags
/// - The program is not the configured binary
#[test]
fn given_launch_when_building_spawn_command_then_uses_binary_and_positional_args() {
    // GIVEN: A launch description
    let launch = NativeLaunchBuilder::default()
        .with_binary("/opt/frame/native")
        .with_config_json("{}")
        .with_host("127.0.0.1")
        .with_port(9000)
        .with_channel_name("chan")
        .with_shutdown_signal("/tmp/chan-1.shutdown")
        .build()
        .unwrap();

    // WHEN: Building the command
    let cmd = build_spawn_command(&launch);

    // THEN: Program and args match the launch
    let std_cmd = cmd.as_std();
    assert_eq!(std_cmd.get_program(), OsStr::new("/opt/frame/native"));
    let args: Vec<&OsStr> = std_cmd.get_args().collect();
    assert_eq!(
        args,
        vec![
            OsStr::new("{}"),
            OsStr::new("127.0.0.1"),
            OsStr::new("9000"),
            OsStr::new("chan"),
            OsStr::new("/tmp/chan-1.shutdown"),
        ]
    );
}

/// **VALUE**: Verifies the default escalation timings.
///
/// **WHY THIS MATTERS**: The rendering process gets 3 seconds to exit on its own
/// and 2 more after a termination request before it is killed.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Default timings drift
/// - A zero duration skips straight to kill
#[test]
fn given_default_policy_when_inspected_then_matches_escalation_timings() {
    // GIVEN / WHEN: The default policy
    let policy = EscalationPolicy::default();

    // THEN: 3s grace, 2s after terminate, bounded kill confirmation
    assert_eq!(policy.grace, Duration::from_secs(3));
    assert_eq!(policy.terminate, Duration::from_secs(2));
    assert!(policy.kill_confirm > Duration::ZERO);
}
