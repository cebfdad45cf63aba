//! Core capability errors (envelope decoding, transcript decoding).
//!
//! These are bounded and stable: core errors describe why a record or a
//! transcript could not be read, not which library failed underneath.

use thiserror::Error;

use crate::error::{Effect, Transience};

/// Failure to encode or decode a conversation record envelope.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error("record json is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transcript payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("transcript payload failed to decompress: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("transcript failed to compress: {0}")]
    Compress(#[source] std::io::Error),

    #[error("record version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("note body is not valid utf-8")]
    NotUtf8,

    #[error("note body holds no records")]
    Empty,
}

impl CodecError {
    pub fn transience(&self) -> Transience {
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

/// Failure to turn transcript bytes into ordered entries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TranscriptError {
    #[error("no transcript decoder registered for agent `{0}`")]
    UnknownAgent(String),

    #[error("transcript line {line} is malformed: {source}")]
    Line {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("transcript is not valid utf-8")]
    NotUtf8,
}

impl TranscriptError {
    pub fn transience(&self) -> Transience {
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}
