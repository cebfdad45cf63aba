//! Git-backed capability errors.

use std::path::PathBuf;

use git2::Oid;
use thiserror::Error;

use crate::core::{CodecError, TranscriptError};
use crate::error::{Effect, Transience};

/// Errors from the note store (attach/read/list/copy).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    #[error("failed to open repository at {0}: {1}")]
    OpenRepo(PathBuf, #[source] git2::Error),

    #[error("`{rev}` does not name a commit: {source}")]
    UnknownRevision {
        rev: String,
        #[source]
        source: git2::Error,
    },

    #[error("record for {0} is not valid utf-8")]
    NotUtf8(Oid),

    #[error("no record attached to {0}")]
    MissingNote(Oid),

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
}

impl StoreError {
    pub fn transience(&self) -> Transience {
        match self {
            StoreError::Git(e) if e.code() == git2::ErrorCode::Locked => Transience::Retryable,
            StoreError::Git(_) => Transience::Unknown,
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            StoreError::Git(_) => Effect::Unknown,
            _ => Effect::None,
        }
    }
}

/// Errors from push/fetch/merge of the notes ref.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncError {
    #[error("remote `{0}` is not configured")]
    NoRemote(String),

    #[error("failed to fetch from `{remote}`: {source}")]
    Fetch {
        remote: String,
        #[source]
        source: git2::Error,
    },

    #[error("push to `{remote}` rejected: remote notes moved since last pull")]
    Diverged { remote: String },

    #[error("failed to push: {0}")]
    Push(#[source] git2::Error),

    #[error(transparent)]
    PushRejected(#[from] PushRejected),

    #[error("{op} exceeded {after_ms}ms")]
    TimedOut { op: &'static str, after_ms: u128 },

    #[error("{name} moved during merge")]
    RefMoved { name: String },

    #[error("too many push retries ({0})")]
    TooManyRetries(usize),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
}

impl SyncError {
    /// Whether retrying this sync may succeed.
    pub fn transience(&self) -> Transience {
        match self {
            SyncError::Fetch { .. }
            | SyncError::Diverged { .. }
            | SyncError::Push(_)
            | SyncError::TimedOut { .. }
            | SyncError::RefMoved { .. }
            | SyncError::TooManyRetries(_) => Transience::Retryable,

            SyncError::NoRemote(_) | SyncError::PushRejected(_) => Transience::Permanent,

            SyncError::Store(e) => e.transience(),
            SyncError::Git(_) => Transience::Unknown,
        }
    }

    /// What we know about side effects when this error is returned.
    pub fn effect(&self) -> Effect {
        match self {
            // Fetch writes only the tracking ref; a rejected push changes nothing.
            SyncError::NoRemote(_)
            | SyncError::Fetch { .. }
            | SyncError::Diverged { .. }
            | SyncError::PushRejected(_)
            | SyncError::RefMoved { .. } => Effect::None,

            SyncError::Push(_) | SyncError::TimedOut { .. } | SyncError::TooManyRetries(_) => {
                Effect::Unknown
            }

            SyncError::Store(e) => e.effect(),
            SyncError::Git(_) => Effect::Unknown,
        }
    }

    pub fn is_diverged(&self) -> bool {
        matches!(self, SyncError::Diverged { .. })
    }
}

/// Push was rejected by the remote with a status message.
#[derive(Error, Debug)]
#[error("push rejected: {message}")]
pub struct PushRejected {
    pub message: String,
}

/// Errors that abort a whole remap pass. Per-commit failures are counted in
/// the report instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RemapError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
}

impl RemapError {
    pub fn transience(&self) -> Transience {
        match self {
            RemapError::Store(e) => e.transience(),
            RemapError::Git(_) => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        // Earlier items of the batch may already have been copied.
        Effect::Unknown
    }
}

/// Errors while computing the incremental transcript boundary.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BoundaryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
}

impl BoundaryError {
    pub fn transience(&self) -> Transience {
        match self {
            BoundaryError::Store(e) => e.transience(),
            BoundaryError::Codec(_) | BoundaryError::Transcript(_) => Transience::Permanent,
            BoundaryError::Git(_) => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}
