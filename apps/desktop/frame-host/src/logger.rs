//! Logging for the frame-host binary.
//!
//! Colored stdout plus a plain `frame-host.log` file. Initialization runs once
//! per process; the relay and orchestrator only ever use the `log` macros.

use crate::error::AppError;

use common::ErrorLocation;

use std::fmt::{Arguments, Display};
use std::fs::create_dir_all;
use std::io::stdout;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use fern::{Dispatch, FormatCallback};
use humantime::format_rfc3339;
use log::{LevelFilter, Record, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "frame-host.log";

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

#[cfg(debug_assertions)]
const LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// WebSocket internals log every frame at debug.
const QUIET_MODULES: [&str; 2] = ["tungstenite", "tokio_tungstenite"];

/// Path of the log file inside `log_dir`.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

/// Install the global logger, writing to stdout and `{log_dir}/frame-host.log`.
///
/// Creates `log_dir` if needed. Safe to call more than once: later calls log a
/// warning and return Ok.
///
/// # Errors
///
/// Returns `AppError::App` if the directory or log file cannot be created, or
/// if another global logger is already installed.
pub fn initialize(log_dir: &Path) -> Result<(), AppError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir);
        if result.is_ok() {
            info!(
                "Logging at {LOG_LEVEL:?} to {}",
                log_file_path(log_dir).display()
            );
        }
    });

    result
}

fn write_line(out: FormatCallback, message: &Arguments, record: &Record, level: impl Display) {
    out.finish(format_args!(
        "[{date} - {level}] {message} [{file}:{line}]",
        date = format_rfc3339(SystemTime::now()),
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}

#[track_caller]
fn initialize_internal(log_dir: &Path) -> Result<(), AppError> {
    let location = ErrorLocation::from(Location::caller());

    create_dir_all(log_dir).map_err(|e| AppError::App {
        message: format!("Failed to create log directory {}: {e}", log_dir.display()),
        location,
    })?;

    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let mut base_dispatch = Dispatch::new().level(LOG_LEVEL);
    for module in QUIET_MODULES {
        base_dispatch = base_dispatch.level_for(module, LevelFilter::Info);
    }

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            write_line(out, message, record, colors.color(record.level()))
        })
        .chain(stdout());

    let log_file = fern::log_file(log_file_path(log_dir)).map_err(|e| AppError::App {
        message: format!("Failed to create log file: {e}"),
        location,
    })?;
    let file_dispatch = Dispatch::new()
        .format(|out, message, record| write_line(out, message, record, record.level()))
        .chain(log_file);

    base_dispatch
        .chain(stdout_dispatch)
        .chain(file_dispatch)
        .apply()
        .map_err(|e| AppError::App {
            message: format!("Failed to initialize logger: {e}"),
            location,
        })?;

    Ok(())
}
