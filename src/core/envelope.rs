//! Conversation record envelope.
//!
//! A record wraps one agent transcript as a self-describing JSON object:
//! the transcript is gzip-compressed and base64-encoded, and a tagged
//! sha256 of the *uncompressed* bytes travels alongside it.
//!
//! Wire format (one compact JSON object per line inside a note):
//! - `version`: schema version, `1..=CURRENT_VERSION`
//! - `session_id`, `timestamp` (RFC 3339), `project_path`, `git_branch`
//! - `message_count`: advisory, never used for integrity
//! - `checksum`: `"sha256:<hex>"`
//! - `transcript`: `base64(gzip(bytes))`
//! - `agent` (optional), `model` (v2+), `effort` (v3+)

use std::fmt;
use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use super::error::CodecError;

/// Schema version stamped by [`Record::encode`].
pub const CURRENT_VERSION: u32 = 3;

const CHECKSUM_ALGORITHM: &str = "sha256";

/// Which agent produced a transcript.
///
/// Unknown names survive a decode/encode cycle untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentKind {
    #[default]
    ClaudeCode,
    Codex,
    GeminiCli,
    OpenCode,
    Other(String),
}

impl AgentKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "claude-code" | "claude" => AgentKind::ClaudeCode,
            "codex" => AgentKind::Codex,
            "gemini-cli" | "gemini" => AgentKind::GeminiCli,
            "opencode" => AgentKind::OpenCode,
            _ => AgentKind::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AgentKind::ClaudeCode => "claude-code",
            AgentKind::Codex => "codex",
            AgentKind::GeminiCli => "gemini-cli",
            AgentKind::OpenCode => "opencode",
            AgentKind::Other(name) => name,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AgentKind {
    fn from(raw: String) -> Self {
        AgentKind::parse(&raw)
    }
}

impl From<AgentKind> for String {
    fn from(kind: AgentKind) -> Self {
        kind.as_str().to_string()
    }
}

impl Serialize for AgentKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AgentKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(AgentKind::from)
    }
}

/// Usage metrics for the session that produced a transcript (v3+).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Effort {
    pub turns: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_input_tokens: u64,
    pub cache_read_input_tokens: u64,
}

/// Provenance supplied by the caller when encoding a record.
#[derive(Clone, Debug)]
pub struct RecordMeta {
    pub session_id: String,
    pub timestamp: OffsetDateTime,
    pub project_path: String,
    pub git_branch: String,
    pub message_count: u64,
    pub agent: AgentKind,
    pub model: Option<String>,
    pub effort: Option<Effort>,
}

impl RecordMeta {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            timestamp: OffsetDateTime::now_utc(),
            project_path: String::new(),
            git_branch: String::new(),
            message_count: 0,
            agent: AgentKind::default(),
            model: None,
            effort: None,
        }
    }
}

/// A persisted conversation record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub session_id: String,
    #[serde(default = "unix_epoch", with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default)]
    pub project_path: String,
    #[serde(default)]
    pub git_branch: String,
    #[serde(default)]
    pub message_count: u64,
    pub checksum: String,
    pub transcript: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<Effort>,
}

fn unix_epoch() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

/// Outcome of checking a record against its checksum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Integrity {
    Verified,
    /// Payload decodes but the digest differs.
    Tampered,
    /// Payload itself cannot be decoded.
    Corrupt(String),
}

impl Integrity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Integrity::Verified => "verified",
            Integrity::Tampered => "tampered",
            Integrity::Corrupt(_) => "corrupt",
        }
    }
}

impl Record {
    /// Wrap raw transcript bytes into a current-version record.
    pub fn encode(transcript: &[u8], meta: RecordMeta) -> Result<Record, CodecError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(transcript)
            .map_err(CodecError::Compress)?;
        let compressed = encoder.finish().map_err(CodecError::Compress)?;

        Ok(Record {
            version: CURRENT_VERSION,
            session_id: meta.session_id,
            timestamp: meta.timestamp,
            project_path: meta.project_path,
            git_branch: meta.git_branch,
            message_count: meta.message_count,
            checksum: checksum_of(transcript),
            transcript: STANDARD.encode(compressed),
            agent: Some(meta.agent),
            model: meta.model,
            effort: meta.effort,
        })
    }

    /// Parse a single record object.
    pub fn decode(raw: &[u8]) -> Result<Record, CodecError> {
        let record: Record = serde_json::from_slice(raw)?;
        if record.version > CURRENT_VERSION {
            return Err(CodecError::UnsupportedVersion {
                found: record.version,
                supported: CURRENT_VERSION,
            });
        }
        Ok(record)
    }

    /// Compact single-line JSON, the form stored inside notes.
    pub fn to_line(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Note body holding just this record.
    pub fn to_note_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut line = self.to_line()?;
        line.push('\n');
        Ok(line.into_bytes())
    }

    /// Decode and decompress the transcript without checking the checksum.
    pub fn transcript_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let compressed = STANDARD.decode(self.transcript.trim())?;
        let mut out = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut out)
            .map_err(CodecError::Decompress)?;
        Ok(out)
    }

    /// `Ok(false)` means the payload decodes but does not match the checksum;
    /// an `Err` means the payload itself is unreadable.
    pub fn verify_integrity(&self) -> Result<bool, CodecError> {
        let bytes = self.transcript_bytes()?;
        Ok(checksum_of(&bytes) == self.checksum)
    }

    pub fn integrity(&self) -> Integrity {
        match self.verify_integrity() {
            Ok(true) => Integrity::Verified,
            Ok(false) => Integrity::Tampered,
            Err(err) => Integrity::Corrupt(err.to_string()),
        }
    }

    /// Agent that produced the transcript; version 1 records imply Claude Code.
    pub fn agent(&self) -> AgentKind {
        self.agent.clone().unwrap_or_default()
    }
}

/// Tagged digest of uncompressed transcript bytes.
pub fn checksum_of(bytes: &[u8]) -> String {
    format!("{CHECKSUM_ALGORITHM}:{}", hex::encode(Sha256::digest(bytes)))
}

/// Split a note body into its records, one JSON object per non-empty line.
///
/// A note written by a single writer holds one line; a note produced by a
/// concurrent-annotation merge holds several.
pub fn decode_note(bytes: &[u8]) -> Result<Vec<Record>, CodecError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CodecError::NotUtf8)?;
    let records = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Record::decode(line.as_bytes()))
        .collect::<Result<Vec<_>, _>>()?;
    if records.is_empty() {
        return Err(CodecError::Empty);
    }
    Ok(records)
}

/// Newest record of a note, ties broken by session id then checksum.
pub fn select_latest(records: &[Record]) -> Option<&Record> {
    records.iter().max_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.session_id.cmp(&b.session_id))
            .then_with(|| a.checksum.cmp(&b.checksum))
    })
}
