//! One project's documents, history and edit entry points.
//!
//! [`ProjectContext`] is the object a host passes around instead of stashing
//! documents in ambient storage. Every mutation goes through
//! [`ProjectContext::save`]: validate, encode, persist, record in history,
//! notify. Reads decode whichever version the history cursor points at.

use std::sync::Arc;

use crate::editing::{EditOperation, HistoryError, VersionHistory, apply};
use crate::io::{ChangeEvent, EventBus, SnapshotStore, StoreError};
use crate::models::{NamedDocument, OutlineNode, ProjectId, Snapshot, SnapshotId};
use crate::parsing::codec::{self, CodecError};
use crate::parsing::resilient_json::{GenerationError, parse_generated_files};
use crate::parsing::{PatchMode, PatchOrigin, build_outline, parse_patch};

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectOptions {
    pub patch_mode: PatchMode,
    /// Keep at most this many versions in memory
    pub history_limit: Option<usize>,
    /// Reject saves when another writer committed since the last read
    pub optimistic_concurrency: bool,
}

/// Result of feeding a chat message to a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The message did not ask for an edit
    NoEdit,
    Applied {
        operation: EditOperation,
        origin: PatchOrigin,
        snapshot_id: SnapshotId,
    },
}

pub struct ProjectContext {
    id: ProjectId,
    store: Arc<dyn SnapshotStore>,
    events: Option<Arc<dyn EventBus>>,
    history: VersionHistory,
    options: ProjectOptions,
}

impl std::fmt::Debug for ProjectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectContext")
            .field("id", &self.id)
            .field("versions", &self.history.len())
            .field("options", &self.options)
            .finish()
    }
}

impl ProjectContext {
    /// Load a project's history from the store
    pub fn open(
        id: ProjectId,
        store: Arc<dyn SnapshotStore>,
        options: ProjectOptions,
    ) -> Result<Self, ProjectError> {
        let history = VersionHistory::from_snapshots(store.list_snapshots(&id)?, options.history_limit);
        log::debug!("Opened project {id} with {} versions", history.len());

        Ok(Self {
            id,
            store,
            events: None,
            history,
            options,
        })
    }

    /// Publish a [`ChangeEvent`] on this bus after every save
    pub fn with_events(mut self, events: Arc<dyn EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn history(&self) -> &VersionHistory {
        &self.history
    }

    pub fn options(&self) -> &ProjectOptions {
        &self.options
    }

    /// Re-read history from the store, e.g. after another writer's change
    /// event. The cursor returns to the newest version.
    pub fn reload(&mut self) -> Result<(), ProjectError> {
        self.history = VersionHistory::from_snapshots(
            self.store.list_snapshots(&self.id)?,
            self.options.history_limit,
        );
        Ok(())
    }

    /// Documents of the version being viewed
    pub fn documents(&self) -> Vec<NamedDocument> {
        self.history
            .current()
            .map(Snapshot::documents)
            .unwrap_or_default()
    }

    /// Navigation outline of the version being viewed
    pub fn outline(&self) -> Vec<OutlineNode> {
        build_outline(&self.documents())
    }

    /// Commit a document set as the newest version
    pub fn save(&mut self, files: &[NamedDocument]) -> Result<Snapshot, ProjectError> {
        codec::validate_for_encoding(files)?;
        let full_text = codec::encode(files);

        let snapshot = if self.options.optimistic_concurrency {
            let expected = self.history.latest().map(|s| s.id);
            self.store.append_snapshot_if_head(&self.id, expected, &full_text)?
        } else {
            self.store.append_snapshot(&self.id, &full_text)?
        };
        self.history.append(snapshot.clone())?;

        log::info!(
            "Saved {} documents to {} as {}",
            files.len(),
            self.id,
            snapshot.id
        );
        if let Some(events) = &self.events {
            events.publish(&ChangeEvent {
                project: self.id.clone(),
                snapshot_id: snapshot.id,
            });
        }

        Ok(snapshot)
    }

    /// Commit the documents from a model generation response
    pub fn ingest_generation(&mut self, raw_output: &str) -> Result<Snapshot, ProjectError> {
        let files = parse_generated_files(raw_output)?;
        self.save(&files)
    }

    /// Apply the edit requested by a chat message to the viewed version
    pub fn apply_chat_message(&mut self, message: &str) -> Result<ChatOutcome, ProjectError> {
        let files = self.documents();
        let Some(found) = parse_patch(message, &files, self.options.patch_mode) else {
            log::debug!("Chat message for {} requested no edit", self.id);
            return Ok(ChatOutcome::NoEdit);
        };

        let next = apply(&files, &found.operation);
        let snapshot = self.save(&next)?;

        Ok(ChatOutcome::Applied {
            operation: found.operation,
            origin: found.origin,
            snapshot_id: snapshot.id,
        })
    }

    /// Move the history cursor to an older version and return its documents
    pub fn view(&mut self, index: usize) -> Result<Vec<NamedDocument>, ProjectError> {
        Ok(self.history.revert(index)?.documents())
    }

    /// Make an older version the newest one by committing its documents again
    pub fn restore(&mut self, index: usize) -> Result<Snapshot, ProjectError> {
        let files = self.view(index)?;
        self.save(&files)
    }
}
