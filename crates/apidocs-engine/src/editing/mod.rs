//! Edits to a document set and the version history they accumulate into.
//!
//! An [`EditOperation`] comes out of the chat patch parser, [`apply::apply`]
//! folds it into a document set, and the caller encodes the result into a
//! new snapshot that [`history::VersionHistory`] records.

pub mod apply;
pub mod history;
pub mod operation;

pub use apply::apply;
pub use history::{HistoryError, VersionHistory};
pub use operation::EditOperation;
