#![forbid(unsafe_code)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod git;
pub mod migrate;
mod paths;
pub mod progress;
pub mod repo;
pub mod telemetry;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

pub use crate::core::{
    AgentKind, AgentRegistry, CanonicalDecoder, ClaudeCodeDecoder, CodecError, Effort, Entry,
    Integrity, Record, RecordMeta, TranscriptDecoder, TranscriptError, decode_note, select_latest,
};
pub use crate::git::{
    Boundary, ContentIdentity, DiffPatchId, MergeReport, NoteStore, RemapOptions, RemapReport,
    SyncOptions, VerifyReport,
};
pub use paths::log_dir;
