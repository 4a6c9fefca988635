//! Initial discovery of the directory tree.

use std::ffi::OsString;
use std::path::Path;

use walkdir::WalkDir;

use super::directory_set::DirectorySet;
use super::error::WatchError;
use super::source::NotificationSource;

/// Directory names that are never watched, matched on the final component.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    names: Vec<OsString>,
}

impl Exclusions {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a directory at `path` is excluded.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| self.names.iter().any(|n| n == name))
    }
}

/// Walk `root` and watch every directory below it, `root` included.
///
/// Returns the number of directories newly watched. Failing to read `root`
/// itself is fatal; unreadable entries deeper in the tree are logged and
/// skipped.
pub fn watch_tree(
    root: &Path,
    dirs: &mut DirectorySet,
    source: &mut dyn NotificationSource,
    exclusions: &Exclusions,
) -> Result<usize, WatchError> {
    let meta = std::fs::metadata(root).map_err(|e| WatchError::WalkFailed {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !meta.is_dir() {
        return Err(WatchError::WalkFailed {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !exclusions.matches(entry.path()));

    let mut added = 0;
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_dir() && dirs.add(source, entry.path()) {
                    added += 1;
                }
            }
            Err(e) if e.depth() == 0 => {
                return Err(WatchError::WalkFailed {
                    path: root.to_path_buf(),
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!("[walk] skipping entry: {e}");
            }
        }
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSource;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_watch_tree_subscribes_every_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("cmd/server")).unwrap();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("main.go"), "package main").unwrap();

        let mut source = FakeSource::new();
        let mut dirs = DirectorySet::new();
        let added = watch_tree(root, &mut dirs, &mut source, &Exclusions::default()).unwrap();

        assert_eq!(added, 4);
        assert!(dirs.contains(root));
        assert!(dirs.contains(&root.join("cmd")));
        assert!(dirs.contains(&root.join("cmd/server")));
        assert!(dirs.contains(&root.join("pkg")));
        assert!(!dirs.contains(&root.join("main.go")));
    }

    #[test]
    fn test_watch_tree_skips_excluded_subtrees() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();

        let mut source = FakeSource::new();
        let mut dirs = DirectorySet::new();
        watch_tree(root, &mut dirs, &mut source, &Exclusions::new([".git"])).unwrap();

        assert_eq!(dirs.len(), 2);
        assert!(!dirs.contains(&root.join(".git")));
        assert!(!dirs.contains(&root.join(".git/objects")));
    }

    #[test]
    fn test_watch_tree_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let mut source = FakeSource::new();
        let mut dirs = DirectorySet::new();
        let result = watch_tree(&missing, &mut dirs, &mut source, &Exclusions::default());

        assert!(matches!(result, Err(WatchError::WalkFailed { .. })));
        assert!(dirs.is_empty());
    }

    #[test]
    fn test_exclusions_match_final_component() {
        let exclusions = Exclusions::new(["node_modules"]);
        assert!(exclusions.matches(Path::new("/app/node_modules")));
        assert!(!exclusions.matches(Path::new("/app/node_modules_old")));
        assert!(!exclusions.matches(Path::new("/app/src")));
    }
}
