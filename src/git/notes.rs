//! Note store: conversation records attached to commits.
//!
//! Records live as git notes under a dedicated notes ref. The store treats
//! note bodies as opaque bytes; encoding is the envelope's business.
//!
//! Writes go through libgit2 in-process, so payload size is bounded only by
//! the object database, never by process argument limits.

use std::collections::{BTreeMap, BTreeSet};

use git2::{ErrorCode, Oid, Repository, TreeWalkMode, TreeWalkResult};

use super::error::StoreError;
use super::history;
use super::refs::{NOTES_REF, refname_to_id_optional, signature};

/// A note body together with the blob that stores it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteBlob {
    pub blob: Oid,
    pub bytes: Vec<u8>,
}

pub struct NoteStore<'r> {
    repo: &'r Repository,
    notes_ref: String,
}

impl<'r> NoteStore<'r> {
    /// Store on the primary conversation notes ref.
    pub fn open(repo: &'r Repository) -> Self {
        Self::with_ref(repo, NOTES_REF)
    }

    pub fn with_ref(repo: &'r Repository, notes_ref: &str) -> Self {
        Self {
            repo,
            notes_ref: notes_ref.to_string(),
        }
    }

    pub fn repo(&self) -> &'r Repository {
        self.repo
    }

    pub fn notes_ref(&self) -> &str {
        &self.notes_ref
    }

    /// Current notes commit, `None` before the first attach.
    pub fn tip(&self) -> Result<Option<Oid>, StoreError> {
        Ok(refname_to_id_optional(self.repo, &self.notes_ref)?)
    }

    /// Attach `bytes` to `commit`, replacing whatever was there.
    pub fn put(&self, commit: Oid, bytes: &[u8]) -> Result<Oid, StoreError> {
        let body = std::str::from_utf8(bytes).map_err(|_| StoreError::NotUtf8(commit))?;
        if let Some(previous) = self.get(commit)?
            && previous != bytes
        {
            tracing::debug!(%commit, notes_ref = %self.notes_ref, "replacing existing record");
        }
        let sig = signature(self.repo)?;
        let blob = self
            .repo
            .note(&sig, &sig, Some(&self.notes_ref), commit, body, true)?;
        tracing::debug!(%commit, %blob, bytes = bytes.len(), "record attached");
        Ok(blob)
    }

    /// Note body attached to `commit`; `Ok(None)` when there is none.
    pub fn get(&self, commit: Oid) -> Result<Option<Vec<u8>>, StoreError> {
        match self.repo.find_note(Some(&self.notes_ref), commit) {
            Ok(note) => Ok(Some(note.message_bytes().to_vec())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn contains(&self, commit: Oid) -> Result<bool, StoreError> {
        Ok(self.get(commit)?.is_some())
    }

    /// Attach `from`'s record to `to`, overwriting `to`'s.
    pub fn copy(&self, from: Oid, to: Oid) -> Result<(), StoreError> {
        let bytes = self.get(from)?.ok_or(StoreError::MissingNote(from))?;
        self.put(to, &bytes)?;
        Ok(())
    }

    /// Detach the record from `commit`. Returns whether one existed.
    pub fn remove(&self, commit: Oid) -> Result<bool, StoreError> {
        if !self.contains(commit)? {
            return Ok(false);
        }
        let sig = signature(self.repo)?;
        self.repo
            .note_delete(commit, Some(&self.notes_ref), &sig, &sig)?;
        Ok(true)
    }

    /// Every annotated commit id, in id order.
    pub fn annotated(&self) -> Result<BTreeSet<Oid>, StoreError> {
        let notes = match self.repo.notes(Some(&self.notes_ref)) {
            Ok(notes) => notes,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };
        let mut annotated = BTreeSet::new();
        for item in notes {
            let (_blob, commit) = item?;
            annotated.insert(commit);
        }
        Ok(annotated)
    }

    /// Every note body keyed by annotated commit.
    pub fn entries(&self) -> Result<BTreeMap<Oid, NoteBlob>, StoreError> {
        match self.tip()? {
            Some(tip) => notes_at_commit(self.repo, tip),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Annotated commits in history order: reachable ones as `git log` would
    /// show them (newest first), then unreachable ones by commit id.
    pub fn list(&self) -> Result<Vec<Oid>, StoreError> {
        let mut remaining = self.annotated()?;
        if remaining.is_empty() {
            return Ok(Vec::new());
        }
        let mut ordered = Vec::with_capacity(remaining.len());
        for oid in history::tracked_history(self.repo)? {
            if remaining.remove(&oid) {
                ordered.push(oid);
                if remaining.is_empty() {
                    break;
                }
            }
        }
        ordered.extend(remaining);
        Ok(ordered)
    }
}

/// Read the note map stored in one notes commit.
///
/// Handles both flat trees and git's fan-out layout (`ab/cdef...`): any path
/// whose separators removed spell a full object id is a note. A full id is as
/// long as the notes commit's own id, so the repository's hash decides it.
pub(crate) fn notes_at_commit(
    repo: &Repository,
    notes_commit: Oid,
) -> Result<BTreeMap<Oid, NoteBlob>, StoreError> {
    let tree = repo.find_commit(notes_commit)?.tree()?;
    let hex_len = notes_commit.to_string().len();
    let mut found = Vec::new();
    tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() != Some(git2::ObjectType::Blob) {
            return TreeWalkResult::Ok;
        }
        let Some(name) = entry.name() else {
            return TreeWalkResult::Ok;
        };
        let path: String = root.chars().filter(|c| *c != '/').chain(name.chars()).collect();
        if path.len() == hex_len
            && let Ok(commit) = Oid::from_str(&path)
        {
            found.push((commit, entry.id()));
        }
        TreeWalkResult::Ok
    })?;

    let mut notes = BTreeMap::new();
    for (commit, blob) in found {
        let bytes = repo.find_blob(blob)?.content().to_vec();
        notes.insert(commit, NoteBlob { blob, bytes });
    }
    Ok(notes)
}
