//! File-backed shutdown latch shared with the rendering process.
//!
//! Either side sets the latch by creating the file; the host also keeps an
//! in-process flag so its own requests are observed without touching disk.
//! Once set it stays set until [`ShutdownSignal::clear`] at teardown.

use crate::SHUTDOWN_SIGNAL_EXTENSION;
use crate::error::signal::SignalError;

use common::ErrorLocation;

use std::env::temp_dir;
use std::fs::{OpenOptions, remove_file};
use std::io::ErrorKind;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::sleep;
use std::time::Duration;

use log::{debug, info};

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    path: PathBuf,
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Latch for one session of `channel_name`, placed in the temp directory.
    pub fn for_session(channel_name: &str, session_id: &str) -> Self {
        Self::at(temp_dir().join(format!(
            "{channel_name}-{session_id}.{SHUTDOWN_SIGNAL_EXTENSION}"
        )))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set the latch. Returns `true` if this call was the one that set it.
    ///
    /// Setting an already-set latch succeeds.
    #[track_caller]
    pub fn set(&self) -> Result<bool, SignalError> {
        let first = !self.flag.swap(true, Ordering::AcqRel);

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(_) => {
                info!("Shutdown signal set ({})", self.path.display());
                Ok(first)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("Shutdown signal already present ({})", self.path.display());
                Ok(false)
            }
            Err(e) => Err(SignalError::Io {
                location: ErrorLocation::from(Location::caller()),
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire) || self.path.exists()
    }

    /// Block the current thread until the latch is set.
    ///
    /// Run this on a blocking worker, never on an async task.
    pub fn wait_blocking(&self, poll: Duration) {
        while !self.is_set() {
            sleep(poll);
        }
        self.flag.store(true, Ordering::Release);
    }

    /// Remove the latch file at the end of a session.
    #[track_caller]
    pub fn clear(&self) -> Result<(), SignalError> {
        match remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SignalError::Io {
                location: ErrorLocation::from(Location::caller()),
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}
