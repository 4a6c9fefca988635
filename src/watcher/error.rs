//! Error types for the watch and reload core.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher, walker and launcher operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("Cannot walk {path}: {reason}")]
    WalkFailed { path: PathBuf, reason: String },

    #[error("File system event error: {details}")]
    EventError { details: String },

    #[error("Failed to launch '{program}': {reason}")]
    LaunchFailed { program: String, reason: String },
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}

impl WatchError {
    /// Wrap a notify error raised while (un)subscribing a specific path.
    pub fn path(path: impl Into<PathBuf>, err: notify::Error) -> Self {
        WatchError::PathWatchFailed {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
