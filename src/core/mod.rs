//! Core domain types for git-convo.
//!
//! - envelope: the versioned, checksummed record format
//! - transcript: canonical entries + explicit agent decoder registry
//! - error: codec / transcript errors

pub mod envelope;
pub mod error;
pub mod transcript;

pub use envelope::{
    AgentKind, CURRENT_VERSION, Effort, Integrity, Record, RecordMeta, checksum_of, decode_note,
    select_latest,
};
pub use error::{CodecError, TranscriptError};
pub use transcript::{
    AgentRegistry, CanonicalDecoder, ClaudeCodeDecoder, ContentBlock, Entry, Role, ToolOutput,
    TranscriptDecoder, slice_after,
};
