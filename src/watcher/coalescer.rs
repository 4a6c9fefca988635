//! Turns the raw event stream into one reload decision per interval.
//!
//! Editors and build tools emit bursts of events for a single logical
//! change. Instead of reacting to each event, the coalescer drains everything
//! buffered since the last tick, keeps the [`DirectorySet`] in step with the
//! tree, and reports whether anything happened at all.

use std::path::Path;

use super::directory_set::DirectorySet;
use super::source::{ChangeEvent, ChangeKind, NotificationSource, SourceItem};
use super::walk::Exclusions;

/// Outcome of one coalescing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadDecision {
    Reload,
    Idle,
}

/// What a single drain observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Non-error events, whatever their kind.
    pub events: usize,
    /// Source-level errors; these never count toward a reload.
    pub errors: usize,
    pub dirs_added: usize,
    pub dirs_removed: usize,
}

impl CycleReport {
    pub fn decision(&self) -> ReloadDecision {
        if self.events > 0 {
            ReloadDecision::Reload
        } else {
            ReloadDecision::Idle
        }
    }
}

/// Drains a notification source and maintains the watched directory set.
#[derive(Debug)]
pub struct EventCoalescer {
    dirs: DirectorySet,
    exclusions: Exclusions,
    verbose: bool,
}

impl EventCoalescer {
    pub fn new(dirs: DirectorySet, exclusions: Exclusions, verbose: bool) -> Self {
        Self {
            dirs,
            exclusions,
            verbose,
        }
    }

    pub fn dirs(&self) -> &DirectorySet {
        &self.dirs
    }

    pub fn dirs_mut(&mut self) -> &mut DirectorySet {
        &mut self.dirs
    }

    /// Drain every pending item from `source` without blocking.
    ///
    /// Events are applied in arrival order, so the last event for a path
    /// decides whether it ends up watched.
    pub fn drain(&mut self, source: &mut dyn NotificationSource) -> CycleReport {
        let mut report = CycleReport::default();

        while let Some(item) = source.try_next() {
            match item {
                SourceItem::Event(event) => {
                    self.apply(source, &event, &mut report);
                    report.events += 1;
                }
                SourceItem::Error(e) => {
                    tracing::error!("[coalescer] {e}");
                    report.errors += 1;
                }
            }
        }

        if report.events > 0 {
            crate::debug_event!(
                "coalescer",
                "drained",
                "{} events, +{} -{} dirs",
                report.events,
                report.dirs_added,
                report.dirs_removed
            );
        }

        report
    }

    fn apply(
        &mut self,
        source: &mut dyn NotificationSource,
        event: &ChangeEvent,
        report: &mut CycleReport,
    ) {
        match event.kind {
            ChangeKind::Created => {
                if self.watch_if_dir(source, &event.path) {
                    report.dirs_added += 1;
                }
            }
            ChangeKind::Deleted => {
                if self.dirs.remove(source, &event.path) {
                    report.dirs_removed += 1;
                }
            }
            ChangeKind::Renamed => {
                // A watched path renamed away is gone; anything else may be a
                // directory that just arrived under its new name.
                if self.dirs.contains(&event.path) {
                    if self.dirs.remove(source, &event.path) {
                        report.dirs_removed += 1;
                    }
                } else if self.watch_if_dir(source, &event.path) {
                    report.dirs_added += 1;
                }
            }
            ChangeKind::Modified => {}
        }
    }

    /// Watch `path` if it currently is a non-excluded directory.
    fn watch_if_dir(&mut self, source: &mut dyn NotificationSource, path: &Path) -> bool {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => {
                if self.exclusions.matches(path) {
                    crate::debug_event!("coalescer", "excluded", "{}", path.display());
                    return false;
                }
                self.dirs.add(source, path)
            }
            Ok(_) => false,
            Err(e) => {
                // Editors create and remove temp files faster than we stat them
                if self.verbose {
                    tracing::warn!("[coalescer] cannot stat {}: {e}", path.display());
                }
                false
            }
        }
    }
}
