//! Extraction of a single edit operation from an AI chat message.
//!
//! The chat channel speaks a small marker grammar:
//!
//! ```text
//! MDX_UPDATE_START
//! filename: auth.mdx
//! content:
//! ...new document body...
//! MDX_UPDATE_END
//! ```
//!
//! with `MDX_ADD_START/END` as a sibling and `MDX_DELETE_START/END` carrying
//! only a filename. At most one operation is taken per message, with update
//! winning over add and add winning over delete.
//!
//! Models do not always follow the grammar. In [`PatchMode::Lenient`] a
//! message without markers is scanned for natural-language fix intent and
//! fenced code blocks (see [`heuristic`]). That path guesses, so callers get
//! a [`PatchOrigin`] to tell the two apart. [`PatchMode::Strict`] turns the
//! guessing off and such messages yield no edit.

pub mod heuristic;
pub mod markers;

use serde::{Deserialize, Serialize};

use crate::editing::EditOperation;
use crate::models::NamedDocument;

/// How much effort to spend finding an edit in a chat message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchMode {
    /// Marker grammar only
    Strict,
    /// Marker grammar, then the natural-language fallback
    #[default]
    Lenient,
}

/// Which parser produced an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOrigin {
    Marker,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchMatch {
    pub operation: EditOperation,
    pub origin: PatchOrigin,
}

/// Find the edit requested by a chat message
///
/// `files` is the document set the conversation is about. The fallback uses
/// it to pick a default target and to splice before/after code blocks.
/// Returns `None` when the message requests no actionable edit.
pub fn parse_patch(message: &str, files: &[NamedDocument], mode: PatchMode) -> Option<PatchMatch> {
    if let Some(operation) = markers::parse(message) {
        log::debug!("Found marker {} for {}", operation.kind(), operation.filename());
        return Some(PatchMatch {
            operation,
            origin: PatchOrigin::Marker,
        });
    }

    if mode == PatchMode::Strict {
        return None;
    }

    let operation = heuristic::parse(message, files)?;
    log::warn!(
        "No patch markers found, guessed {} for {}",
        operation.kind(),
        operation.filename()
    );
    Some(PatchMatch {
        operation,
        origin: PatchOrigin::Heuristic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::sample_files;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_update_wins_over_add() {
        let message = "\
MDX_ADD_START
filename: new.mdx
content:
Added
MDX_ADD_END

MDX_UPDATE_START
filename: intro.mdx
content:
Updated
MDX_UPDATE_END";

        let found = parse_patch(message, &sample_files(), PatchMode::Lenient).unwrap();

        assert_eq!(found.origin, PatchOrigin::Marker);
        assert_eq!(found.operation, EditOperation::update("intro.mdx", "Updated"));
    }

    #[test]
    fn test_strict_mode_ignores_prose() {
        let message = "Here's the fix for `intro.mdx`:\n\n```mdx\n# Intro\n```";

        assert_eq!(parse_patch(message, &sample_files(), PatchMode::Strict), None);

        let lenient = parse_patch(message, &sample_files(), PatchMode::Lenient).unwrap();
        assert_eq!(lenient.origin, PatchOrigin::Heuristic);
    }

    #[test]
    fn test_plain_chat_is_no_edit() {
        let message = "The authentication page explains bearer tokens.";
        assert_eq!(parse_patch(message, &sample_files(), PatchMode::Lenient), None);
    }

    #[test]
    fn test_patch_mode_deserializes_lowercase() {
        let mode: PatchMode = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(mode, PatchMode::Strict);
        assert_eq!(PatchMode::default(), PatchMode::Lenient);
    }
}
