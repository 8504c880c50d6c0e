use std::collections::HashSet;

use crate::models::NamedDocument;

/// Separator placed between encoded documents
pub const DELIMITER: &str = "\n\n---\n\n";

const HEADING_PREFIX: &str = "# ";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Document '{0}' contains the snapshot delimiter and would not survive decoding")]
    DelimiterInContent(String),
    #[error("Document filename must not be empty")]
    EmptyFilename,
    #[error("Document filename '{0}' must be a single line")]
    MultilineFilename(String),
    #[error("Duplicate document filename: {0}")]
    DuplicateFilename(String),
}

/// What decoding had to guess
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    /// Filenames invented for blocks that had no leading `# filename` line
    pub synthesized: Vec<String>,
}

impl DecodeReport {
    pub fn is_clean(&self) -> bool {
        self.synthesized.is_empty()
    }
}

/// Pack a document set into one snapshot blob
///
/// Content is not escaped. Use [`validate_for_encoding`] first when the
/// result must decode back to the same set.
pub fn encode(files: &[NamedDocument]) -> String {
    files
        .iter()
        .map(|file| format!("{HEADING_PREFIX}{}\n\n{}", file.filename, file.content))
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

/// Unpack a snapshot blob into its documents
pub fn decode(blob: &str) -> Vec<NamedDocument> {
    decode_with_report(blob).0
}

/// Unpack a snapshot blob, reporting any filenames that had to be invented
pub fn decode_with_report(blob: &str) -> (Vec<NamedDocument>, DecodeReport) {
    let mut files = Vec::new();
    let mut report = DecodeReport::default();

    for block in blob.split(DELIMITER) {
        if block.trim().is_empty() {
            continue;
        }

        match split_heading(block) {
            Some((filename, rest)) => {
                files.push(NamedDocument::new(filename, rest.trim()));
            }
            None => {
                let filename = format!("section-{}.mdx", report.synthesized.len() + 1);
                log::warn!("Snapshot block has no filename heading, using {filename}");
                report.synthesized.push(filename.clone());
                files.push(NamedDocument::new(filename, block.trim()));
            }
        }
    }

    (files, report)
}

/// Check that a document set survives an encode/decode round trip
pub fn validate_for_encoding(files: &[NamedDocument]) -> Result<(), CodecError> {
    let mut seen = HashSet::new();

    for file in files {
        if file.filename.trim().is_empty() {
            return Err(CodecError::EmptyFilename);
        }
        if file.filename.contains('\n') || file.filename.contains('\r') {
            return Err(CodecError::MultilineFilename(file.filename.clone()));
        }
        // Blocks are framed by blank lines on both sides once encoded
        if format!("\n\n{}\n\n", file.content).contains(DELIMITER) {
            return Err(CodecError::DelimiterInContent(file.filename.clone()));
        }
        if !seen.insert(file.filename.as_str()) {
            return Err(CodecError::DuplicateFilename(file.filename.clone()));
        }
    }

    Ok(())
}

/// Split a block into its heading capture and the remaining text
///
/// Only the first non-blank line is considered a filename heading.
fn split_heading(block: &str) -> Option<(&str, &str)> {
    let start = block.len() - block.trim_start().len();
    let body = &block[start..];
    let (line, rest) = match body.split_once('\n') {
        Some((line, rest)) => (line, rest),
        None => (body, ""),
    };

    let filename = line.strip_suffix('\r').unwrap_or(line).strip_prefix(HEADING_PREFIX)?;
    Some((filename.trim(), rest))
}
