//! Natural-language fallback for chat messages without patch markers.
//!
//! Recognises messages such as "I've identified the problem in `auth.mdx`.
//! Here's the fix:" followed by one or two fenced code blocks. With two
//! blocks the first is the text being replaced and the second is the
//! replacement. With one block it is the replacement. Everything here is a
//! guess and favours finding an edit over precision.

use std::sync::OnceLock;

use regex::Regex;

use crate::editing::EditOperation;
use crate::models::{NamedDocument, find_document};

const FIX_CUES: &[&str] = &[
    "i've identified",
    "i have identified",
    "here's the fix",
    "here is the fix",
    "i recommend fixing this by",
    "to fix this",
    "the fix is",
    "here's the corrected",
    "here is the corrected",
    "here's the updated",
    "here is the updated",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Add,
    Delete,
    Update,
}

struct Patterns {
    code_block: Regex,
    quoted_file: Regex,
    bare_file: Regex,
    add: Regex,
    delete: Regex,
    replace: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        code_block: Regex::new(r"(?s)```[^\n]*\n(.*?)```").expect("Invalid code block regex"),
        quoted_file: Regex::new(r#"[`"'“”]([^`"'“”\s]+\.(?i:mdx))[`"'“”]"#)
            .expect("Invalid quoted file regex"),
        bare_file: Regex::new(r"\b([\w./-]+\.(?i:mdx))\b").expect("Invalid file regex"),
        add: Regex::new(r"\badd(?:s|ed|ing)?\b").expect("Invalid add regex"),
        delete: Regex::new(r"\b(?:remov|delet)(?:e|es|ed|ing)\b").expect("Invalid delete regex"),
        replace: Regex::new(r"\b(?:replac|edit|updat)(?:e|es|ed|ing|s)?\b")
            .expect("Invalid replace regex"),
    })
}

/// Guess one edit from free text, or `None` when the signal is too weak
pub fn parse(message: &str, files: &[NamedDocument]) -> Option<EditOperation> {
    let patterns = patterns();
    let blocks: Vec<&str> = patterns
        .code_block
        .captures_iter(message)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim_end_matches('\n'))
        .take(2)
        .collect();
    let text = patterns
        .code_block
        .replace_all(message, " ")
        .replace('’', "'");
    let prose = text.to_lowercase();

    if !FIX_CUES.iter().any(|cue| prose.contains(cue)) {
        return None;
    }

    let named = mentioned_file(&text, files);
    let intent = classify(&prose);

    if intent == Intent::Delete && blocks.is_empty() {
        // Deleting on a guessed target is too destructive
        return named.map(EditOperation::delete);
    }

    let filename = named.or_else(|| files.first().map(|f| f.filename.clone()))?;
    let existing = find_document(files, &filename).map(|f| f.content.as_str());

    let (before, after) = match blocks.as_slice() {
        [] => return None,
        [after] => (None, *after),
        [before, after, ..] => (Some(*before), *after),
    };

    let content = match (intent, existing, before) {
        (Intent::Add, Some(existing), _) => format!("{}\n\n{}", existing.trim_end(), after),
        (_, Some(existing), Some(before)) if !before.is_empty() && existing.contains(before) => {
            existing.replacen(before, after, 1)
        }
        _ => after.to_string(),
    };

    Some(match intent {
        Intent::Add if existing.is_none() => EditOperation::add(filename, content),
        _ => EditOperation::update(filename, content),
    })
}

/// First `.mdx` file mentioned outside code blocks, preferring files in scope
///
/// Names outside the scope keep the casing the message used.
fn mentioned_file(text: &str, files: &[NamedDocument]) -> Option<String> {
    let patterns = patterns();
    let quoted = patterns.quoted_file.captures_iter(text).filter_map(|c| c.get(1));
    let bare = patterns.bare_file.captures_iter(text).filter_map(|c| c.get(1));
    let mentioned: Vec<&str> = quoted.chain(bare).map(|m| m.as_str()).collect();

    mentioned
        .iter()
        .find_map(|name| {
            files
                .iter()
                .find(|f| f.filename.eq_ignore_ascii_case(name))
                .map(|f| f.filename.clone())
        })
        .or_else(|| mentioned.first().map(|name| name.to_string()))
}

fn classify(prose: &str) -> Intent {
    let patterns = patterns();
    // "replace the removed example" is still an update
    if patterns.replace.is_match(prose) {
        Intent::Update
    } else if patterns.add.is_match(prose) {
        Intent::Add
    } else if patterns.delete.is_match(prose) {
        Intent::Delete
    } else {
        Intent::Update
    }
}
