//! Text-level parsing: the snapshot codec, the heading outline, the chat
//! patch grammar and recovery of malformed model JSON.
//!
//! Everything in here is pure and synchronous. No function performs I/O.

pub mod codec;
pub mod outline;
pub mod patch;
pub mod resilient_json;

pub use codec::{CodecError, DecodeReport, decode, decode_with_report, encode};
pub use outline::{build_outline, outline_for_document, slugify};
pub use patch::{PatchMatch, PatchMode, PatchOrigin, parse_patch};
pub use resilient_json::{GenerationError, JsonRecoveryError, parse_generated_files, parse_json};
