//! Git integration module.
//!
//! Provides:
//! - NoteStore: records attached to commits under a dedicated notes ref
//! - Sync typestate machine (Idle → Fetched → Merged → Idle) and push retry
//! - Notes ref merging with the line-union combine rule
//! - Remap: re-attaching records after history rewrites, keyed by patch id
//! - Boundary resolution for incremental transcripts
//! - Batch integrity verification

pub mod boundary;
pub mod error;
pub(crate) mod history;
pub mod merge;
pub mod notes;
pub mod patch_id;
pub mod refs;
pub mod remap;
pub mod remote;
pub mod sync;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_support;

pub use boundary::{Boundary, Incremental, resolve_boundary, resolve_incremental};
pub use error::{BoundaryError, PushRejected, RemapError, StoreError, SyncError};
pub use merge::{MergeOutcome, MergeReport, combine_notes, merge_notes_refs};
pub use notes::{NoteBlob, NoteStore};
pub use patch_id::{ContentIdentity, DiffPatchId, PatchId};
pub use refs::{LEGACY_NOTES_REF, NOTES_REF, TRACKING_REF};
pub use remap::{CandidateSource, RemapOptions, RemapReport, Remapped, remap};
pub use remote::Deadline;
pub use sync::{PushOutcome, SyncOptions, SyncProcess, pull, push, push_with_retry};
pub use verify::{RecordStatus, VerifyReport, verify_all};
