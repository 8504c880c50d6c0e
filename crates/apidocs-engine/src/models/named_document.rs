use serde::{Deserialize, Serialize};

/// A single logical document inside a snapshot, keyed by its filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedDocument {
    pub filename: String,
    pub content: String,
}

impl NamedDocument {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Filename with its final extension removed (`auth.mdx` -> `auth`)
    pub fn stem(&self) -> &str {
        match self.filename.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.filename,
        }
    }
}

/// Find a document by filename
pub fn find_document<'a>(files: &'a [NamedDocument], filename: &str) -> Option<&'a NamedDocument> {
    files.iter().find(|file| file.filename == filename)
}
