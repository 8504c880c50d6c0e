use crate::models::{Snapshot, SnapshotId};

/// The cap the product applies to browser-local history
pub const LOCAL_HISTORY_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Version {index} does not exist (history has {len} versions)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Snapshot {0} is older than the newest version")]
    OutOfOrder(SnapshotId),
}

/// Append-only list of snapshots, newest first, with a browse cursor
///
/// Browsing with [`VersionHistory::revert`] only moves the cursor. The only
/// way to change the list is [`VersionHistory::append`], which also moves the
/// cursor back to the newest version.
#[derive(Debug, Clone, Default)]
pub struct VersionHistory {
    snapshots: Vec<Snapshot>,
    current_index: usize,
    limit: Option<usize>,
}

impl VersionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `limit` versions, dropping the oldest
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    /// Build from stored snapshots in any order
    pub fn from_snapshots(mut snapshots: Vec<Snapshot>, limit: Option<usize>) -> Self {
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let mut history = Self {
            snapshots,
            current_index: 0,
            limit: limit.map(|l| l.max(1)),
        };
        history.enforce_limit();
        history
    }

    /// Record a new newest version and point the cursor at it
    pub fn append(&mut self, snapshot: Snapshot) -> Result<(), HistoryError> {
        if let Some(latest) = self.snapshots.first()
            && snapshot.created_at < latest.created_at
        {
            return Err(HistoryError::OutOfOrder(snapshot.id));
        }

        self.snapshots.insert(0, snapshot);
        self.current_index = 0;
        self.enforce_limit();
        Ok(())
    }

    /// Point the cursor at an older version for viewing
    ///
    /// This never creates a snapshot. To make the viewed version the newest
    /// one, save its documents again through the normal commit path.
    pub fn revert(&mut self, index: usize) -> Result<&Snapshot, HistoryError> {
        if index >= self.snapshots.len() {
            return Err(HistoryError::IndexOutOfRange {
                index,
                len: self.snapshots.len(),
            });
        }
        self.current_index = index;
        Ok(&self.snapshots[index])
    }

    /// The version currently being viewed
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    pub fn is_viewing_latest(&self) -> bool {
        self.current_index == 0
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshots newest first
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    fn enforce_limit(&mut self) {
        if let Some(limit) = self.limit
            && self.snapshots.len() > limit
        {
            self.snapshots.truncate(limit);
            self.current_index = self.current_index.min(limit - 1);
        }
    }
}
