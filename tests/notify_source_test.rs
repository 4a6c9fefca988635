//! Tests for the notify-backed source feeding the coalescer

use reloader::watcher::{DirectorySet, EventCoalescer, Exclusions, watch_tree};
use reloader::{ChangeKind, NotificationSource, NotifySource};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Drain repeatedly until `done` holds or the deadline passes.
fn drain_until(
    coalescer: &mut EventCoalescer,
    source: &mut NotifySource,
    mut done: impl FnMut(&EventCoalescer, usize) -> bool,
) -> usize {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = 0;
    while Instant::now() < deadline {
        events += coalescer.drain(source).events;
        if done(coalescer, events) {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    events
}

#[test]
fn test_created_directory_gets_watched() {
    let temp_dir = TempDir::new().unwrap();
    let root = fs::canonicalize(temp_dir.path()).unwrap();

    let mut source = NotifySource::new().unwrap();
    let mut dirs = DirectorySet::new();
    watch_tree(&root, &mut dirs, &mut source, &Exclusions::default()).unwrap();
    let mut coalescer = EventCoalescer::new(dirs, Exclusions::default(), false);

    let sub = root.join("sub");
    fs::create_dir(&sub).unwrap();

    drain_until(&mut coalescer, &mut source, |c, _| c.dirs().contains(&sub));
    assert!(coalescer.dirs().contains(&sub));

    // Events from inside the new directory now arrive too
    fs::write(sub.join("handler.go"), "package sub").unwrap();
    let events = drain_until(&mut coalescer, &mut source, |_, n| n > 0);
    assert!(events > 0);
}

#[test]
fn test_deleted_directory_is_dropped() {
    let temp_dir = TempDir::new().unwrap();
    let root = fs::canonicalize(temp_dir.path()).unwrap();
    let sub = root.join("sub");
    fs::create_dir(&sub).unwrap();

    let mut source = NotifySource::new().unwrap();
    let mut dirs = DirectorySet::new();
    watch_tree(&root, &mut dirs, &mut source, &Exclusions::default()).unwrap();
    assert!(dirs.contains(&sub));
    let mut coalescer = EventCoalescer::new(dirs, Exclusions::default(), false);

    fs::remove_dir(&sub).unwrap();

    drain_until(&mut coalescer, &mut source, |c, _| !c.dirs().contains(&sub));
    assert!(!coalescer.dirs().contains(&sub));
    assert!(coalescer.dirs().contains(&root));
}

#[test]
fn test_renamed_directory_stays_watched() {
    let temp_dir = TempDir::new().unwrap();
    let root = fs::canonicalize(temp_dir.path()).unwrap();
    let old = root.join("old");
    let new = root.join("new");
    fs::create_dir(&old).unwrap();

    let mut source = NotifySource::new().unwrap();
    let mut dirs = DirectorySet::new();
    watch_tree(&root, &mut dirs, &mut source, &Exclusions::default()).unwrap();
    assert!(dirs.contains(&old));
    let mut coalescer = EventCoalescer::new(dirs, Exclusions::default(), false);

    fs::rename(&old, &new).unwrap();

    drain_until(&mut coalescer, &mut source, |c, _| {
        c.dirs().contains(&new) && !c.dirs().contains(&old)
    });

    // Let any trailing halves of the rename arrive before checking again
    std::thread::sleep(Duration::from_millis(300));
    coalescer.drain(&mut source);

    assert!(coalescer.dirs().contains(&new));
    assert!(!coalescer.dirs().contains(&old));

    // Changes under the new name are still seen
    fs::write(new.join("handler.go"), "package new").unwrap();
    let events = drain_until(&mut coalescer, &mut source, |_, n| n > 0);
    assert!(events > 0);
    assert!(coalescer.dirs().contains(&new));
}

#[test]
fn test_file_write_yields_event_for_path() {
    let temp_dir = TempDir::new().unwrap();
    let root = fs::canonicalize(temp_dir.path()).unwrap();

    let mut source = NotifySource::new().unwrap();
    source.subscribe(&root).unwrap();

    let file = root.join("main.go");
    fs::write(&file, "package main").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while Instant::now() < deadline && seen.is_empty() {
        while let Some(item) = source.try_next() {
            if let reloader::watcher::SourceItem::Event(event) = item {
                seen.push(event);
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    assert!(
        seen.iter()
            .any(|e| e.path == file && matches!(e.kind, ChangeKind::Created | ChangeKind::Modified))
    );
}

#[test]
fn test_try_next_on_quiet_source_returns_none() {
    let temp_dir = TempDir::new().unwrap();
    let mut source = NotifySource::new().unwrap();
    source.subscribe(temp_dir.path()).unwrap();

    assert!(source.try_next().is_none());
}

#[test]
fn test_subscribe_missing_path_fails() {
    let mut source = NotifySource::new().unwrap();
    assert!(source.subscribe(Path::new("/definitely/not/here")).is_err());
}
