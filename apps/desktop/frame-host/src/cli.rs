//! Command-line interface and the `remove-cache` command.

use crate::error::AppError;

use host_core::DEFAULT_ADDRESS;

use common::ErrorLocation;

use std::fs::{read_dir, remove_dir_all};
use std::io::ErrorKind;
use std::panic::Location;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use const_format::concatcp;
use log::{debug, info};

/// Directory name used for per-project build caches.
pub const CACHE_DIR_NAME: &str = ".frame-cache";

/// Per-user cache directory name under the platform cache root.
pub const USER_CACHE_DIR_NAME: &str = "frame-host";

/// Desktop host for web frontends.
#[derive(Parser, Debug)]
#[command(name = "frame-host", version, about = "Desktop host for web frontends")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start a session: relay, rendering process, and built-in commands.
    Run {
        /// Directory holding config.json (default: platform config dir)
        #[arg(long)]
        config_dir: Option<PathBuf>,

        /// Directory for frame-host.log (default: platform data dir)
        #[arg(long)]
        log_dir: Option<PathBuf>,

        #[arg(
            long,
            value_name = "HOST:PORT",
            help = concatcp!("Relay address overriding the config, e.g. ", DEFAULT_ADDRESS)
        )]
        address: Option<String>,
    },

    /// Delete cached build artifacts.
    RemoveCache {
        /// Directory searched for .frame-cache folders (default: current dir)
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

/// Per-user cache directory, if the platform has one.
pub fn user_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(USER_CACHE_DIR_NAME))
}

/// Remove every `.frame-cache` directory below `root`, then the per-user cache.
///
/// Returns the number of directories removed.
pub fn remove_cache(root: &Path) -> Result<usize, AppError> {
    let mut removed = remove_cache_dirs(root)?;

    if let Some(user_cache) = user_cache_dir()
        && remove_dir_if_present(&user_cache)?
    {
        removed += 1;
    }

    info!("Removed {removed} cache director(ies)");
    Ok(removed)
}

/// Remove every `.frame-cache` directory below `root`.
///
/// Symlinks are never followed. Directories inside a removed cache are not
/// visited.
#[track_caller]
pub fn remove_cache_dirs(root: &Path) -> Result<usize, AppError> {
    let location = ErrorLocation::from(Location::caller());
    let mut removed = 0;
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = read_dir(&dir).map_err(|e| AppError::Cache {
            message: format!("Failed to read {}: {e}", dir.display()),
            location,
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| AppError::Cache {
                message: format!("Failed to read entry in {}: {e}", dir.display()),
                location,
            })?;
            let is_dir = entry.file_type().is_ok_and(|kind| kind.is_dir());
            if !is_dir {
                continue;
            }

            let path = entry.path();
            if entry.file_name() == CACHE_DIR_NAME {
                if remove_dir_if_present(&path)? {
                    removed += 1;
                }
            } else {
                pending.push(path);
            }
        }
    }

    Ok(removed)
}

#[track_caller]
fn remove_dir_if_present(path: &Path) -> Result<bool, AppError> {
    match remove_dir_all(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AppError::Cache {
            message: format!("Failed to remove {}: {e}", path.display()),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}
