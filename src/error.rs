use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::core::{CodecError, TranscriptError};
use crate::git::{BoundaryError, RemapError, StoreError, SyncError};
use crate::migrate::MigrateError;

/// Whether retrying this operation may succeed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// Retry will never help without changing inputs/state.
    Permanent,
    /// Retry may help (transient contention/outage).
    Retryable,
    /// Unknown if retry will help.
    Unknown,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// What we know about side effects when an error is returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    /// Definitely no side effects occurred.
    None,
    /// Side effects definitely occurred (locally or remotely).
    Some,
    /// We don't know if side effects occurred.
    Unknown,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::Some => "some",
            Effect::Unknown => "unknown",
        }
    }
}

/// Crate-level convenience error.
///
/// Not a "god error": it is a thin wrapper over canonical capability errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Remap(#[from] RemapError),

    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    #[error(transparent)]
    Migrate(#[from] MigrateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {path}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("failed to render json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn transience(&self) -> Transience {
        match self {
            Error::Codec(e) => e.transience(),
            Error::Transcript(e) => e.transience(),
            Error::Store(e) => e.transience(),
            Error::Sync(e) => e.transience(),
            Error::Remap(e) => e.transience(),
            Error::Boundary(e) => e.transience(),
            Error::Migrate(e) => e.transience(),
            Error::Config(e) => e.transience(),
            Error::ReadInput { .. } | Error::Json(_) => Transience::Permanent,
            Error::Output(_) => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            Error::Codec(e) => e.effect(),
            Error::Transcript(e) => e.effect(),
            Error::Store(e) => e.effect(),
            Error::Sync(e) => e.effect(),
            Error::Remap(e) => e.effect(),
            Error::Boundary(e) => e.effect(),
            Error::Migrate(e) => e.effect(),
            Error::Config(e) => e.effect(),
            Error::ReadInput { .. } | Error::Json(_) => Effect::None,
            // Output failures happen after the command has already acted.
            Error::Output(_) => Effect::Unknown,
        }
    }
}
