//! Bookkeeping for the directories currently subscribed.
//!
//! The set owns membership; every mutation is mirrored to the notification
//! source so the two never disagree about what is watched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::source::NotificationSource;

/// Set of watched directories.
#[derive(Debug, Default)]
pub struct DirectorySet {
    dirs: HashSet<PathBuf>,
}

impl DirectorySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `path` unless it already is.
    ///
    /// Returns `true` if the path was newly subscribed. A failed subscribe is
    /// logged and leaves the set untouched.
    pub fn add(&mut self, source: &mut dyn NotificationSource, path: &Path) -> bool {
        if self.dirs.contains(path) {
            return false;
        }

        match source.subscribe(path) {
            Ok(()) => {
                crate::debug_event!("dirs", "watching", "{}", path.display());
                self.dirs.insert(path.to_path_buf())
            }
            Err(e) => {
                tracing::warn!("[dirs] {e}");
                false
            }
        }
    }

    /// Stop watching `path` if it is watched.
    ///
    /// Returns `true` if the path was a member.
    pub fn remove(&mut self, source: &mut dyn NotificationSource, path: &Path) -> bool {
        if !self.dirs.remove(path) {
            return false;
        }

        // The OS usually drops the watch of a deleted directory on its own
        if let Err(e) = source.unsubscribe(path) {
            crate::debug_event!("dirs", "unwatch failed", "{e}");
        }
        crate::debug_event!("dirs", "unwatched", "{}", path.display());
        true
    }

    /// Check if a path is watched.
    pub fn contains(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }
}
