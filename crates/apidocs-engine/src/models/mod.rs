pub mod named_document;
pub mod outline_node;
pub mod project_id;
pub mod snapshot;

pub use named_document::{NamedDocument, find_document};
pub use outline_node::OutlineNode;
pub use project_id::{InvalidProjectId, ProjectId};
pub use snapshot::{Snapshot, SnapshotId};
