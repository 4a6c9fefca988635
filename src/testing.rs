//! In-memory fakes for the notification source and the process launcher.

use std::collections::{HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::process::{LaunchSpec, Launcher};
use crate::watcher::{ChangeEvent, ChangeKind, NotificationSource, SourceItem, WatchError};

/// Scripted notification source that records subscriptions.
#[derive(Debug, Default)]
pub struct FakeSource {
    queue: VecDeque<SourceItem>,
    failing: HashSet<PathBuf>,
    pub fail_unsubscribe: bool,
    pub subscribed: Vec<PathBuf>,
    pub unsubscribed: Vec<PathBuf>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<PathBuf>, kind: ChangeKind) {
        self.queue
            .push_back(SourceItem::Event(ChangeEvent::new(path, kind)));
    }

    pub fn push_error(&mut self, details: &str) {
        self.queue.push_back(SourceItem::Error(WatchError::EventError {
            details: details.to_string(),
        }));
    }

    pub fn fail_subscribe(&mut self, path: &Path) {
        self.failing.insert(path.to_path_buf());
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl NotificationSource for FakeSource {
    fn subscribe(&mut self, path: &Path) -> Result<(), WatchError> {
        if self.failing.contains(path) {
            return Err(WatchError::PathWatchFailed {
                path: path.to_path_buf(),
                reason: "permission denied".to_string(),
            });
        }
        self.subscribed.push(path.to_path_buf());
        Ok(())
    }

    fn unsubscribe(&mut self, path: &Path) -> Result<(), WatchError> {
        self.unsubscribed.push(path.to_path_buf());
        if self.fail_unsubscribe {
            return Err(WatchError::PathWatchFailed {
                path: path.to_path_buf(),
                reason: "no such watch".to_string(),
            });
        }
        Ok(())
    }

    fn try_next(&mut self) -> Option<SourceItem> {
        self.queue.pop_front()
    }
}

/// Everything a [`FakeLauncher`] was asked to do.
#[derive(Debug, Default)]
pub struct LaunchLog {
    pub launches: Vec<LaunchSpec>,
    /// Ids of handles whose process was actually terminated.
    pub kills: Vec<u64>,
    /// Kill calls on handles that were already dead.
    pub redundant_kills: usize,
}

#[derive(Debug)]
pub struct FakeHandle {
    pub id: u64,
    pub alive: bool,
}

/// Launcher that spawns nothing and logs every call.
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    log: Arc<Mutex<LaunchLog>>,
    next_id: u64,
    pub fail_launch: bool,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the log, usable after the launcher moved into a supervisor.
    pub fn log(&self) -> Arc<Mutex<LaunchLog>> {
        self.log.clone()
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    type Handle = FakeHandle;

    fn launch(&mut self, spec: &LaunchSpec) -> FakeHandle {
        self.next_id += 1;
        self.log.lock().unwrap().launches.push(spec.clone());
        FakeHandle {
            id: self.next_id,
            alive: !self.fail_launch,
        }
    }

    async fn kill(&mut self, handle: &mut FakeHandle) {
        let mut log = self.log.lock().unwrap();
        if handle.alive {
            handle.alive = false;
            log.kills.push(handle.id);
        } else {
            log.redundant_kills += 1;
        }
    }
}

/// Run `f` under a thread-local subscriber and return everything it logged.
pub fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || LogBuffer(writer.clone()))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}

struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
