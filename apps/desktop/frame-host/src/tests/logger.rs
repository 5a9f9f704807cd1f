// Unit tests for logger initialization.
// The global logger can be installed once per test binary, so every test that
// calls initialize() runs serially and tolerates a logger already being set.

use crate::logger::{LOG_FILE_NAME, initialize, log_file_path};

use std::path::Path;

use serial_test::serial;
use tempfile::TempDir;

/// **VALUE**: Verifies that calling initialize() twice doesn't panic or fail.
///
/// **WHY THIS MATTERS**: Startup code and tests may both initialize logging.
/// A second call that panicked would crash the host before the session starts.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are removed,
/// causing fern to fail when setting a global logger twice.
#[test]
#[serial]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A log directory that does not exist yet
    let temp = TempDir::new().unwrap();
    let log_dir = temp.path().join("nested").join("logs");

    // WHEN: Calling initialize twice
    let first = initialize(&log_dir);
    let second = initialize(&log_dir);

    // THEN: Both return Ok
    assert!(first.is_ok(), "First initialization should succeed");
    assert!(second.is_ok(), "Second initialization should be a no-op");
}

/// **VALUE**: Verifies the log file location.
///
/// **WHY THIS MATTERS**: Bug reports ask users for frame-host.log from the
/// log directory; the name must stay stable.
///
/// **BUG THIS CATCHES**: Would catch a renamed or relocated log file.
#[test]
fn given_log_dir_when_resolving_file_then_frame_host_log_inside() {
    // GIVEN / WHEN
    let path = log_file_path(Path::new("/var/log/app"));

    // THEN
    assert_eq!(LOG_FILE_NAME, "frame-host.log");
    assert_eq!(path, Path::new("/var/log/app/frame-host.log"));
}
