use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::models::{ProjectId, Snapshot, SnapshotId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt snapshot file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Project changed since it was read (expected newest {expected:?}, found {actual:?})")]
    StaleHead {
        expected: Option<SnapshotId>,
        actual: Option<SnapshotId>,
    },
}

/// Append-only snapshot persistence, keyed by project
pub trait SnapshotStore: Send + Sync {
    /// All snapshots of a project, newest first
    fn list_snapshots(&self, project: &ProjectId) -> Result<Vec<Snapshot>, StoreError>;

    /// Persist a new newest snapshot
    fn append_snapshot(&self, project: &ProjectId, full_text: &str) -> Result<Snapshot, StoreError>;

    /// Persist a new snapshot only if the newest stored one is `expected_head`
    ///
    /// The default implementation checks then appends without holding a lock
    /// across both steps. Stores that can do better override it.
    fn append_snapshot_if_head(
        &self,
        project: &ProjectId,
        expected_head: Option<SnapshotId>,
        full_text: &str,
    ) -> Result<Snapshot, StoreError> {
        let actual = self.list_snapshots(project)?.first().map(|s| s.id);
        if actual != expected_head {
            return Err(StoreError::StaleHead {
                expected: expected_head,
                actual,
            });
        }
        self.append_snapshot(project, full_text)
    }
}

/// Create a snapshot stamped no earlier than the current newest one
fn next_snapshot(full_text: &str, newest: Option<&Snapshot>) -> Snapshot {
    let now = Utc::now();
    let created_at = match newest {
        Some(newest) if newest.created_at > now => newest.created_at,
        _ => now,
    };
    Snapshot::at(full_text, created_at)
}

fn check_head(expected: Option<SnapshotId>, newest: Option<&Snapshot>) -> Result<(), StoreError> {
    let actual = newest.map(|s| s.id);
    if actual == expected {
        Ok(())
    } else {
        Err(StoreError::StaleHead { expected, actual })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Snapshots held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: Mutex<HashMap<ProjectId, Vec<Snapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn list_snapshots(&self, project: &ProjectId) -> Result<Vec<Snapshot>, StoreError> {
        Ok(lock(&self.projects).get(project).cloned().unwrap_or_default())
    }

    fn append_snapshot(&self, project: &ProjectId, full_text: &str) -> Result<Snapshot, StoreError> {
        let mut projects = lock(&self.projects);
        let snapshots = projects.entry(project.clone()).or_default();
        let snapshot = next_snapshot(full_text, snapshots.first());
        snapshots.insert(0, snapshot.clone());
        Ok(snapshot)
    }

    fn append_snapshot_if_head(
        &self,
        project: &ProjectId,
        expected_head: Option<SnapshotId>,
        full_text: &str,
    ) -> Result<Snapshot, StoreError> {
        let mut projects = lock(&self.projects);
        let snapshots = projects.entry(project.clone()).or_default();
        check_head(expected_head, snapshots.first())?;
        let snapshot = next_snapshot(full_text, snapshots.first());
        snapshots.insert(0, snapshot.clone());
        Ok(snapshot)
    }
}

/// Snapshots stored as JSON files, one directory per project
///
/// Layout: `<root>/<project-id>/<sequence>-<snapshot-id>.json`. The zero
/// padded sequence keeps directory order equal to commit order.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn project_dir(&self, project: &ProjectId) -> PathBuf {
        self.root.join(project.as_str())
    }

    /// Snapshot files of a project, newest first
    fn snapshot_files(&self, project: &ProjectId) -> Result<Vec<PathBuf>, StoreError> {
        let dir = self.project_dir(project);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file()
                && let Some(ext) = path.extension()
                && ext == "json"
            {
                files.push(path);
            }
        }
        files.sort();
        files.reverse();
        Ok(files)
    }

    fn read_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_next(
        &self,
        project: &ProjectId,
        snapshot: &Snapshot,
        sequence: usize,
    ) -> Result<(), StoreError> {
        let dir = self.project_dir(project);
        fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{sequence:08}-{}.json", snapshot.id));
        let content = serde_json::to_string_pretty(snapshot).map_err(StoreError::Serialize)?;

        // Only complete files get a .json name; temp names are never listed
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(&path).map_err(|e| e.error)?;
        log::debug!("Wrote snapshot {} to {}", snapshot.id, path.display());
        Ok(())
    }

    fn append_checked(
        &self,
        project: &ProjectId,
        expected_head: Option<Option<SnapshotId>>,
        full_text: &str,
    ) -> Result<Snapshot, StoreError> {
        let _guard = lock(&self.write_lock);
        let files = self.snapshot_files(project)?;
        let newest = match files.first() {
            Some(path) => Some(Self::read_snapshot(path)?),
            None => None,
        };

        if let Some(expected) = expected_head {
            check_head(expected, newest.as_ref())?;
        }

        let snapshot = next_snapshot(full_text, newest.as_ref());
        self.write_next(project, &snapshot, files.len() + 1)?;
        Ok(snapshot)
    }
}

impl SnapshotStore for FileStore {
    fn list_snapshots(&self, project: &ProjectId) -> Result<Vec<Snapshot>, StoreError> {
        self.snapshot_files(project)?
            .iter()
            .map(|path| Self::read_snapshot(path))
            .collect()
    }

    fn append_snapshot(&self, project: &ProjectId, full_text: &str) -> Result<Snapshot, StoreError> {
        self.append_checked(project, None, full_text)
    }

    fn append_snapshot_if_head(
        &self,
        project: &ProjectId,
        expected_head: Option<SnapshotId>,
        full_text: &str,
    ) -> Result<Snapshot, StoreError> {
        self.append_checked(project, Some(expected_head), full_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_store_dir, project};
    use pretty_assertions::assert_eq;

    fn texts(snapshots: &[Snapshot]) -> Vec<&str> {
        snapshots.iter().map(|s| s.full_text.as_str()).collect()
    }

    fn exercise_append_and_list(store: &dyn SnapshotStore) {
        let id = project("petstore");
        assert!(store.list_snapshots(&id).unwrap().is_empty());

        let first = store.append_snapshot(&id, "v1").unwrap();
        let second = store.append_snapshot(&id, "v2").unwrap();

        let listed = store.list_snapshots(&id).unwrap();
        assert_eq!(texts(&listed), vec!["v2", "v1"]);
        assert_eq!(listed[0].id, second.id);
        assert!(listed[0].created_at >= first.created_at);
        assert!(store.list_snapshots(&project("other")).unwrap().is_empty());
    }

    fn exercise_optimistic_append(store: &dyn SnapshotStore) {
        let id = project("petstore");
        let first = store.append_snapshot_if_head(&id, None, "v1").unwrap();

        let stale = store.append_snapshot_if_head(&id, None, "racing write");
        assert!(matches!(
            stale,
            Err(StoreError::StaleHead { expected: None, actual: Some(actual) }) if actual == first.id
        ));

        store.append_snapshot_if_head(&id, Some(first.id), "v2").unwrap();
        assert_eq!(texts(&store.list_snapshots(&id).unwrap()), vec!["v2", "v1"]);
    }

    #[test]
    fn test_memory_store_append_and_list() {
        exercise_append_and_list(&MemoryStore::new());
    }

    #[test]
    fn test_memory_store_optimistic_append() {
        exercise_optimistic_append(&MemoryStore::new());
    }

    #[test]
    fn test_file_store_append_and_list() {
        let dir = create_test_store_dir();
        exercise_append_and_list(&FileStore::new(dir.path()));
    }

    #[test]
    fn test_file_store_optimistic_append() {
        let dir = create_test_store_dir();
        exercise_optimistic_append(&FileStore::new(dir.path()));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = create_test_store_dir();
        let id = project("petstore");
        let written = FileStore::new(dir.path()).append_snapshot(&id, "# a.mdx\n\nbody").unwrap();

        let reopened = FileStore::new(dir.path()).list_snapshots(&id).unwrap();

        assert_eq!(reopened, vec![written]);
    }

    #[test]
    fn test_file_store_ignores_other_files() {
        let dir = create_test_store_dir();
        let id = project("petstore");
        let store = FileStore::new(dir.path());
        store.append_snapshot(&id, "v1").unwrap();
        std::fs::write(dir.path().join("petstore").join("notes.txt"), "ignore me").unwrap();

        assert_eq!(store.list_snapshots(&id).unwrap().len(), 1);
    }

    #[test]
    fn test_file_store_leaves_no_temp_files_behind() {
        let dir = create_test_store_dir();
        let id = project("petstore");
        let store = FileStore::new(dir.path());
        store.append_snapshot(&id, "v1").unwrap();
        store.append_snapshot(&id, "v2").unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path().join("petstore"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|name| name.ends_with(".json")));
    }

    #[test]
    fn test_file_store_ignores_interrupted_write() {
        let dir = create_test_store_dir();
        let id = project("petstore");
        let store = FileStore::new(dir.path());
        store.append_snapshot(&id, "v1").unwrap();
        std::fs::write(dir.path().join("petstore").join(".tmpA1b2C3"), "{\"id\": ").unwrap();

        store.append_snapshot(&id, "v2").unwrap();

        assert_eq!(texts(&store.list_snapshots(&id).unwrap()), vec!["v2", "v1"]);
    }

    #[test]
    fn test_file_store_reports_corrupt_file() {
        let dir = create_test_store_dir();
        let id = project("petstore");
        let project_dir = dir.path().join("petstore");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("00000001-broken.json"), "{not json").unwrap();

        let result = FileStore::new(dir.path()).list_snapshots(&id);

        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }
}
