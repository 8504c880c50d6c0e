use std::sync::OnceLock;

use regex::Regex;

use crate::models::{NamedDocument, OutlineNode};

fn heading_regex() -> &'static Regex {
    static HEADING_REGEX: OnceLock<Regex> = OnceLock::new();
    HEADING_REGEX.get_or_init(|| Regex::new(r"^(#{1,3})\s+(.+)$").expect("Invalid heading regex"))
}

/// Build the navigation outline for a document set, one top-level node per
/// document in order
pub fn build_outline(files: &[NamedDocument]) -> Vec<OutlineNode> {
    files.iter().map(outline_for_document).collect()
}

/// Build the outline node for a single document
///
/// The node id is derived from the filename so deep links survive title
/// edits. A `#` heading replaces the display title, `##` headings become
/// children and `###` headings nest under the closest preceding `##`.
/// A `###` with no preceding `##` is dropped.
pub fn outline_for_document(file: &NamedDocument) -> OutlineNode {
    let mut section = OutlineNode::new(slugify(file.stem()), file.stem());
    let mut in_fence: Option<&str> = None;

    for line in file.content.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(marker) = fence_marker(line) {
            in_fence = match in_fence {
                None => Some(marker),
                Some(open) if marker.starts_with(open) => None,
                still_open => still_open,
            };
            continue;
        }
        if in_fence.is_some() {
            continue;
        }

        let Some(captures) = heading_regex().captures(line) else {
            continue;
        };
        let title = captures[2].trim().to_string();

        match captures[1].len() {
            1 => section.title = title,
            2 => section.children.push(OutlineNode::new(slugify(&title), title)),
            _ => match section.children.last_mut() {
                Some(parent) => parent.children.push(OutlineNode::new(slugify(&title), title)),
                None => log::debug!(
                    "Dropping level 3 heading '{title}' in {} with no level 2 parent",
                    file.filename
                ),
            },
        }
    }

    section
}

/// Turn heading text into a lowercase, hyphenated identifier
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Opening/closing fence run (three or more backticks or tildes)
fn fence_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    for fence_char in ['`', '~'] {
        let run = trimmed.len() - trimmed.trim_start_matches(fence_char).len();
        if run >= 3 {
            return Some(&trimmed[..run]);
        }
    }
    None
}
