//! Incremental transcript boundaries.
//!
//! When a session spans several commits, each commit's record holds the whole
//! transcript so far. The boundary is the last entry an ancestor's record
//! already covered, so showing a commit can skip everything before it.

use git2::{Oid, Repository};

use super::error::BoundaryError;
use super::notes::NoteStore;
use crate::core::{AgentRegistry, Entry, Record, decode_note, select_latest, slice_after};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Boundary {
    /// No parent carries the same session; the whole transcript is new.
    Undefined,
    At { parent: Oid, last_entry_id: String },
}

impl Boundary {
    /// Entries after the boundary. Undefined, or an id missing from
    /// `entries`, yields everything.
    pub fn slice<'a>(&self, entries: &'a [Entry]) -> &'a [Entry] {
        match self {
            Boundary::Undefined => entries,
            Boundary::At { last_entry_id, .. } => slice_after(entries, last_entry_id),
        }
    }
}

/// Walk `commit`'s parents in order and take the first one whose record
/// continues `current`'s session.
///
/// If that record's transcript cannot be read back, the boundary is
/// [`Boundary::Undefined`] and the whole current transcript counts as new.
pub fn resolve_boundary(
    repo: &Repository,
    store: &NoteStore<'_>,
    registry: &AgentRegistry,
    commit: Oid,
    current: &Record,
) -> Result<Boundary, BoundaryError> {
    let commit = repo.find_commit(commit)?;
    for parent in commit.parent_ids() {
        let Some(bytes) = store.get(parent)? else {
            continue;
        };
        let records = match decode_note(&bytes) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(%parent, error = %e, "skipping undecodable parent record");
                continue;
            }
        };
        let same_session: Vec<Record> = records
            .into_iter()
            .filter(|r| r.session_id == current.session_id)
            .collect();
        let Some(record) = select_latest(&same_session) else {
            continue;
        };

        let decoded = record
            .transcript_bytes()
            .map_err(BoundaryError::from)
            .and_then(|bytes| {
                registry
                    .decode(&record.agent(), &bytes)
                    .map_err(BoundaryError::from)
            });
        let entries = match decoded {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(%parent, error = %e, "parent transcript unreadable; no boundary");
                return Ok(Boundary::Undefined);
            }
        };
        return Ok(match entries.last() {
            Some(last) => Boundary::At {
                parent,
                last_entry_id: last.id.clone(),
            },
            None => Boundary::Undefined,
        });
    }
    Ok(Boundary::Undefined)
}

/// A commit's newest record with only the transcript entries its ancestors
/// have not already recorded.
#[derive(Clone, Debug)]
pub struct Incremental {
    pub record: Record,
    pub boundary: Boundary,
    pub entries: Vec<Entry>,
}

/// `Ok(None)` when `commit` has no record.
pub fn resolve_incremental(
    repo: &Repository,
    store: &NoteStore<'_>,
    registry: &AgentRegistry,
    commit: Oid,
) -> Result<Option<Incremental>, BoundaryError> {
    let Some(bytes) = store.get(commit)? else {
        return Ok(None);
    };
    let records = decode_note(&bytes)?;
    let Some(record) = select_latest(&records).cloned() else {
        return Ok(None);
    };
    let all = registry.decode(&record.agent(), &record.transcript_bytes()?)?;
    let boundary = resolve_boundary(repo, store, registry, commit, &record)?;
    let entries = boundary.slice(&all).to_vec();
    tracing::debug!(%commit, ?boundary, total = all.len(), new = entries.len(), "incremental transcript");
    Ok(Some(Incremental {
        record,
        boundary,
        entries,
    }))
}
