//! Notification sources feeding the coalescer.
//!
//! The core never talks to the OS facility directly: it subscribes
//! directories and polls a non-blocking queue through [`NotificationSource`].
//! [`NotifySource`] is the production implementation over `notify`.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, TryRecvError};
use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::error::WatchError;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Deleted,
    Renamed,
    Modified,
}

/// A single raw notification, consumed once by the coalescer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// One item pulled from a source: either an event or a source-level error.
#[derive(Debug)]
pub enum SourceItem {
    Event(ChangeEvent),
    Error(WatchError),
}

/// A pollable stream of filesystem changes scoped to subscribed directories.
pub trait NotificationSource: Send {
    /// Start receiving events for entries directly inside `path`.
    fn subscribe(&mut self, path: &Path) -> Result<(), WatchError>;

    /// Stop receiving events for `path`.
    fn unsubscribe(&mut self, path: &Path) -> Result<(), WatchError>;

    /// Return the next buffered item without waiting.
    ///
    /// `None` means nothing is pending right now, not end of stream.
    fn try_next(&mut self) -> Option<SourceItem>;
}

/// Notification source backed by the platform's recommended `notify` watcher.
///
/// The watcher thread pushes raw results into an unbounded channel that
/// [`try_next`](NotificationSource::try_next) drains.
pub struct NotifySource {
    watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    /// One notify event may carry several paths; the extras wait here.
    pending: VecDeque<ChangeEvent>,
}

impl NotifySource {
    /// Create the OS watcher. Failure here is a fatal setup error.
    pub fn new() -> Result<Self, WatchError> {
        let (tx, rx) = crossbeam_channel::unbounded();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the loop shut down
            let _ = tx.send(res);
        })?;

        Ok(Self {
            watcher,
            rx,
            pending: VecDeque::new(),
        })
    }
}

impl NotificationSource for NotifySource {
    fn subscribe(&mut self, path: &Path) -> Result<(), WatchError> {
        self.watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::path(path, e))
    }

    fn unsubscribe(&mut self, path: &Path) -> Result<(), WatchError> {
        self.watcher
            .unwatch(path)
            .map_err(|e| WatchError::path(path, e))
    }

    fn try_next(&mut self) -> Option<SourceItem> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(SourceItem::Event(event));
            }

            match self.rx.try_recv() {
                Ok(Ok(event)) => {
                    let Some(kind) = classify(&event.kind) else {
                        crate::debug_event!("source", "ignored", "{:?}", event.kind);
                        continue;
                    };
                    self.pending.extend(
                        event
                            .paths
                            .into_iter()
                            .map(|path| ChangeEvent::new(path, kind)),
                    );
                }
                Ok(Err(e)) => {
                    return Some(SourceItem::Error(WatchError::EventError {
                        details: e.to_string(),
                    }));
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }
}

/// Map a notify event kind onto the four kinds the coalescer understands.
///
/// Pure access notifications (open, read, close without write) are dropped:
/// the child reading its own sources must not trigger a restart.
///
/// A rename arrives as the old name (`From`), the new name (`To`) and, on
/// inotify, a paired `Both` event repeating both paths. The new name is a
/// creation as far as the tree is concerned; `Both` is dropped so the new
/// name is not seen a second time and unwatched again.
pub(crate) fn classify(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => None,
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Renamed),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(ChangeKind::Modified),
        EventKind::Access(_) => None,
        EventKind::Any | EventKind::Other => Some(ChangeKind::Modified),
    }
}
