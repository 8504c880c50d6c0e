pub mod editing;
pub mod io;
pub mod models;
pub mod parsing;
pub mod project;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{apply::apply, history::*, operation::EditOperation};
pub use io::{events::*, store::*};
pub use models::{
    InvalidProjectId, NamedDocument, OutlineNode, ProjectId, Snapshot, SnapshotId, find_document,
};
pub use parsing::{
    codec::{decode, encode},
    outline::{build_outline, slugify},
    patch::{PatchMatch, PatchMode, PatchOrigin, parse_patch},
    resilient_json::{GenerationError, JsonRecoveryError, parse_generated_files},
};
pub use project::*;
