use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::NamedDocument;
use crate::parsing::codec;

/// Stable identifier of a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(Uuid);

impl SnapshotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One immutable, fully encoded version of a project's documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub full_text: String,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(full_text: impl Into<String>) -> Self {
        Self::at(full_text, Utc::now())
    }

    pub fn at(full_text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: SnapshotId::new(),
            full_text: full_text.into(),
            created_at,
        }
    }

    /// Encode a document set into a new snapshot
    pub fn from_documents(files: &[NamedDocument]) -> Self {
        Self::new(codec::encode(files))
    }

    /// Materialize the document set this snapshot encodes
    pub fn documents(&self) -> Vec<NamedDocument> {
        codec::decode(&self.full_text)
    }
}
