use crate::editing::EditOperation;
use crate::models::NamedDocument;

/// Fold one edit into a document set, returning the next set
///
/// Filenames are the identity of a document, so add and update converge:
/// updating a missing file adds it and adding an existing file replaces it.
/// Deleting a missing file leaves the set unchanged. Document order is
/// preserved and new files go last.
pub fn apply(files: &[NamedDocument], op: &EditOperation) -> Vec<NamedDocument> {
    let mut next = files.to_vec();

    match op {
        EditOperation::Update { filename, content } | EditOperation::Add { filename, content } => {
            match next.iter().position(|file| &file.filename == filename) {
                Some(index) => next[index].content = content.clone(),
                None => {
                    if matches!(op, EditOperation::Update { .. }) {
                        log::warn!("Update target {filename} not found, adding it instead");
                    }
                    next.push(NamedDocument::new(filename.clone(), content.clone()));
                }
            }
        }
        EditOperation::Delete { filename } => {
            let before = next.len();
            next.retain(|file| &file.filename != filename);
            if next.len() == before {
                log::warn!("Delete target {filename} not found, nothing removed");
            }
        }
    }

    next
}
