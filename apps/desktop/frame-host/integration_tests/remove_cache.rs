// End-to-end tests for the frame-host binary's remove-cache command.

use std::fs::create_dir_all;
use std::process::Command;

use tempfile::TempDir;

const BINARY: &str = env!("CARGO_BIN_EXE_frame-host");

/// **VALUE**: Verifies the `remove-cache` command from the outside.
///
/// **WHY THIS MATTERS**: Build scripts run `frame-host remove-cache` and check
/// its exit status before rebuilding.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The subcommand is not wired to the cache removal
/// - The process exits non-zero on success
#[test]
fn given_project_with_cache_when_remove_cache_runs_then_exits_zero_and_cache_gone() {
    // GIVEN: A project tree with a cache directory
    let temp = TempDir::new().unwrap();
    let cache = temp.path().join("web").join(".frame-cache");
    create_dir_all(cache.join("bundle")).unwrap();

    // WHEN: Running the binary
    let output = Command::new(BINARY)
        .arg("remove-cache")
        .arg("--root")
        .arg(temp.path())
        .output()
        .unwrap();

    // THEN: It succeeds and the cache is removed
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(!cache.exists());
    assert!(temp.path().join("web").exists());
}

/// **VALUE**: Verifies that a bad root fails loudly.
///
/// **WHY THIS MATTERS**: Scripts rely on the exit code to notice a wrong path.
///
/// **BUG THIS CATCHES**: Would catch errors being printed but exiting 0.
#[test]
fn given_missing_root_when_remove_cache_runs_then_exits_non_zero() {
    // GIVEN
    let temp = TempDir::new().unwrap();

    // WHEN
    let output = Command::new(BINARY)
        .arg("remove-cache")
        .arg("--root")
        .arg(temp.path().join("missing"))
        .output()
        .unwrap();

    // THEN
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Cache Error"));
}

/// **VALUE**: Verifies that the binary refuses to run without a subcommand.
///
/// **BUG THIS CATCHES**: Would catch a default action silently starting a session.
#[test]
fn given_no_subcommand_when_invoked_then_usage_error() {
    let output = Command::new(BINARY).output().unwrap();
    assert!(!output.status.success());
}
