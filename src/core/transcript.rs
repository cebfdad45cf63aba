//! Canonical transcript entries and the agent decoder registry.
//!
//! Each agent writes its own log format. A [`TranscriptDecoder`] turns those
//! bytes into an ordered list of [`Entry`] values with stable ids; the rest of
//! the crate only ever looks at ids and order.
//!
//! Decoders are registered explicitly: [`AgentRegistry::builtin`] lists the
//! shipped decoders, and callers can build their own registry from any set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::envelope::AgentKind;
use super::error::TranscriptError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Typed content of an entry, selected by the `type` discriminator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: ToolOutput,
        #[serde(default)]
        is_error: bool,
    },
    /// Block kinds this crate does not model (images, documents, ...).
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Text(String),
    Parts(Vec<ContentBlock>),
}

impl Default for ToolOutput {
    fn default() -> Self {
        ToolOutput::Text(String::new())
    }
}

/// One canonical transcript entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
}

/// Decode one agent's native log format.
pub trait TranscriptDecoder: Send + Sync {
    fn agent(&self) -> AgentKind;

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Entry>, TranscriptError>;
}

/// Explicit agent → decoder table.
pub struct AgentRegistry {
    decoders: BTreeMap<AgentKind, Box<dyn TranscriptDecoder>>,
}

impl AgentRegistry {
    /// Later decoders for the same agent replace earlier ones.
    pub fn new(decoders: Vec<Box<dyn TranscriptDecoder>>) -> Self {
        let decoders = decoders
            .into_iter()
            .map(|decoder| (decoder.agent(), decoder))
            .collect();
        Self { decoders }
    }

    pub fn builtin() -> Self {
        Self::new(vec![Box::new(ClaudeCodeDecoder), Box::new(CanonicalDecoder)])
    }

    pub fn decoder_for(&self, agent: &AgentKind) -> Result<&dyn TranscriptDecoder, TranscriptError> {
        self.decoders
            .get(agent)
            .map(|decoder| decoder.as_ref())
            .ok_or_else(|| TranscriptError::UnknownAgent(agent.to_string()))
    }

    pub fn decode(&self, agent: &AgentKind, bytes: &[u8]) -> Result<Vec<Entry>, TranscriptError> {
        self.decoder_for(agent)?.decode(bytes)
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentKind> {
        self.decoders.keys()
    }
}

/// Entries strictly after the entry whose id is `boundary`.
///
/// An unknown boundary id yields the whole list: callers must never lose
/// context because an ancestor's transcript was trimmed or rewritten.
pub fn slice_after<'a>(entries: &'a [Entry], boundary: &str) -> &'a [Entry] {
    match entries.iter().position(|entry| entry.id == boundary) {
        Some(idx) => &entries[idx + 1..],
        None => entries,
    }
}

fn lines(bytes: &[u8]) -> Result<impl Iterator<Item = (usize, &str)>, TranscriptError> {
    let text = std::str::from_utf8(bytes).map_err(|_| TranscriptError::NotUtf8)?;
    Ok(text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty()))
}

// =============================================================================
// Claude Code JSONL
// =============================================================================

/// Claude Code session logs: one JSON object per line, discriminated by `type`.
/// Only `user` and `assistant` lines become entries.
pub struct ClaudeCodeDecoder;

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum ClaudeLine {
    User(ClaudeMessageLine),
    Assistant(ClaudeMessageLine),
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ClaudeMessageLine {
    uuid: String,
    #[serde(default)]
    message: ClaudeMessage,
}

#[derive(Deserialize, Default)]
struct ClaudeMessage {
    #[serde(default)]
    content: ClaudeContent,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClaudeContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for ClaudeContent {
    fn default() -> Self {
        ClaudeContent::Blocks(Vec::new())
    }
}

impl ClaudeContent {
    fn into_blocks(self) -> Vec<ContentBlock> {
        match self {
            ClaudeContent::Text(text) => vec![ContentBlock::Text { text }],
            ClaudeContent::Blocks(blocks) => blocks,
        }
    }
}

impl TranscriptDecoder for ClaudeCodeDecoder {
    fn agent(&self) -> AgentKind {
        AgentKind::ClaudeCode
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Entry>, TranscriptError> {
        let mut entries = Vec::new();
        for (line_no, line) in lines(bytes)? {
            let parsed: ClaudeLine = serde_json::from_str(line).map_err(|source| {
                TranscriptError::Line {
                    line: line_no,
                    source,
                }
            })?;
            let (role, body) = match parsed {
                ClaudeLine::User(body) => (Role::User, body),
                ClaudeLine::Assistant(body) => (Role::Assistant, body),
                ClaudeLine::Other => continue,
            };
            entries.push(Entry {
                id: body.uuid,
                role,
                blocks: body.message.content.into_blocks(),
            });
        }
        Ok(entries)
    }
}

// =============================================================================
// Canonical JSONL
// =============================================================================

/// Already-canonical transcripts: one serialized [`Entry`] per line.
pub struct CanonicalDecoder;

impl CanonicalDecoder {
    pub const AGENT: &'static str = "canonical";
}

impl TranscriptDecoder for CanonicalDecoder {
    fn agent(&self) -> AgentKind {
        AgentKind::Other(Self::AGENT.to_string())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Entry>, TranscriptError> {
        lines(bytes)?
            .map(|(line_no, line)| {
                serde_json::from_str(line).map_err(|source| TranscriptError::Line {
                    line: line_no,
                    source,
                })
            })
            .collect()
    }
}
