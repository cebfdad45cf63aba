//! Merging two notes refs.
//!
//! A note holds one record per line, so two diverged notes for the same
//! commit combine by concatenating, sorting and deduplicating their lines.
//! The rule is commutative and idempotent, which is what makes re-merging a
//! stale tracking ref harmless.

use std::collections::{BTreeMap, BTreeSet};

use git2::{ErrorCode, Oid, Repository};
use serde::Serialize;

use super::error::SyncError;
use super::notes::{NoteBlob, notes_at_commit};
use super::refs::{refname_to_id_optional, signature};

/// Combine two note bodies: union of their non-empty lines, sorted, one per
/// line with a trailing newline.
pub fn combine_notes(a: &[u8], b: &[u8]) -> Vec<u8> {
    let lines: BTreeSet<&[u8]> = a
        .split(|c| *c == b'\n')
        .chain(b.split(|c| *c == b'\n'))
        .filter(|line| !line.is_empty())
        .collect();

    let mut out = Vec::with_capacity(a.len() + b.len());
    for line in lines {
        out.extend_from_slice(line);
        out.push(b'\n');
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// Source ref does not exist.
    NothingToMerge,
    /// Source is already contained in target.
    UpToDate,
    /// Target did not exist and now points at source.
    Adopted {
        #[serde(serialize_with = "ser_oid")]
        oid: Oid,
    },
    FastForward {
        #[serde(serialize_with = "ser_oid")]
        from: Oid,
        #[serde(serialize_with = "ser_oid")]
        to: Oid,
    },
    /// A two-parent notes commit was written.
    Merged {
        #[serde(serialize_with = "ser_oid")]
        commit: Oid,
    },
}

fn ser_oid<S: serde::Serializer>(oid: &Oid, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(oid)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub outcome: MergeOutcome,
    /// Notes the source added or replaced where the target was untouched.
    pub added: usize,
    /// Notes both sides changed, combined line by line.
    pub combined: usize,
    /// Notes identical on both sides.
    pub unchanged: usize,
    /// Notes the source removed where the target was untouched.
    pub removed: usize,
}

impl MergeReport {
    pub(crate) fn bare(outcome: MergeOutcome) -> Self {
        Self {
            outcome,
            added: 0,
            combined: 0,
            unchanged: 0,
            removed: 0,
        }
    }

    pub fn changed_local(&self) -> bool {
        matches!(
            self.outcome,
            MergeOutcome::Adopted { .. }
                | MergeOutcome::FastForward { .. }
                | MergeOutcome::Merged { .. }
        )
    }
}

/// Merge the notes at `source_ref` into `target_ref`.
///
/// Diverged refs merge three ways against their merge base: a note only one
/// side changed (including a removal) takes that side, and only notes both
/// sides changed are combined with [`combine_notes`]. A note removed on one
/// side and edited on the other keeps the edit.
///
/// The target update is a compare-and-swap against the value read on entry;
/// if someone else moved it meanwhile the merge fails with
/// [`SyncError::RefMoved`] and nothing is written.
pub fn merge_notes_refs(
    repo: &Repository,
    target_ref: &str,
    source_ref: &str,
) -> Result<MergeReport, SyncError> {
    let Some(source) = refname_to_id_optional(repo, source_ref)? else {
        return Ok(MergeReport::bare(MergeOutcome::NothingToMerge));
    };

    let Some(target) = refname_to_id_optional(repo, target_ref)? else {
        let log = format!("notes: adopt {source_ref}");
        return match repo.reference(target_ref, source, false, &log) {
            Ok(_) => {
                let added = notes_at_commit(repo, source)?.len();
                tracing::debug!(%source, added, "adopted remote notes");
                Ok(MergeReport {
                    added,
                    ..MergeReport::bare(MergeOutcome::Adopted { oid: source })
                })
            }
            Err(e) if e.code() == ErrorCode::Exists => Err(SyncError::RefMoved {
                name: target_ref.to_string(),
            }),
            Err(e) => Err(e.into()),
        };
    };

    if target == source || repo.graph_descendant_of(target, source)? {
        return Ok(MergeReport::bare(MergeOutcome::UpToDate));
    }

    let ours = notes_at_commit(repo, target)?;
    let theirs = notes_at_commit(repo, source)?;

    if repo.graph_descendant_of(source, target)? {
        let plan = plan_merge(&ours, &ours, &theirs);
        update_target(repo, target_ref, source, target, "notes: fast-forward")?;
        tracing::debug!(from = %target, to = %source, added = plan.added, "fast-forwarded notes");
        return Ok(plan.report(MergeOutcome::FastForward {
            from: target,
            to: source,
        }));
    }

    let base = match repo.merge_base(target, source) {
        Ok(base) => notes_at_commit(repo, base)?,
        Err(e) if e.code() == ErrorCode::NotFound => BTreeMap::new(),
        Err(e) => return Err(e.into()),
    };
    let plan = plan_merge(&base, &ours, &theirs);

    let mut builder = repo.treebuilder(None)?;
    for (commit, resolved) in &plan.notes {
        let blob = match resolved {
            Resolved::Blob(blob) => *blob,
            Resolved::Combined(body) => {
                tracing::debug!(%commit, "combining concurrent records");
                repo.blob(body)?
            }
        };
        builder.insert(commit.to_string(), blob, 0o100644)?;
    }
    let tree = repo.find_tree(builder.write()?)?;
    let sig = signature(repo)?;
    let parents = [&repo.find_commit(target)?, &repo.find_commit(source)?];
    let message = format!("notes: merge {source_ref} into {target_ref}");
    let commit = repo.commit(None, &sig, &sig, &message, &tree, &parents)?;

    update_target(repo, target_ref, commit, target, &message)?;
    tracing::debug!(
        %commit,
        added = plan.added,
        combined = plan.combined,
        unchanged = plan.unchanged,
        removed = plan.removed,
        "merged notes"
    );

    Ok(plan.report(MergeOutcome::Merged { commit }))
}

enum Resolved {
    Blob(Oid),
    Combined(Vec<u8>),
}

#[derive(Default)]
struct MergePlan {
    notes: BTreeMap<Oid, Resolved>,
    added: usize,
    combined: usize,
    unchanged: usize,
    removed: usize,
}

impl MergePlan {
    fn report(self, outcome: MergeOutcome) -> MergeReport {
        MergeReport {
            outcome,
            added: self.added,
            combined: self.combined,
            unchanged: self.unchanged,
            removed: self.removed,
        }
    }
}

/// Resolve every annotated commit from the base, ours and theirs.
fn plan_merge(
    base: &BTreeMap<Oid, NoteBlob>,
    ours: &BTreeMap<Oid, NoteBlob>,
    theirs: &BTreeMap<Oid, NoteBlob>,
) -> MergePlan {
    let commits: BTreeSet<Oid> = base
        .keys()
        .chain(ours.keys())
        .chain(theirs.keys())
        .copied()
        .collect();

    let mut plan = MergePlan::default();
    for commit in commits {
        let b = base.get(&commit);
        let o = ours.get(&commit);
        let t = theirs.get(&commit);
        let blob_of = |n: Option<&NoteBlob>| n.map(|n| n.blob);

        let resolved = if blob_of(o) == blob_of(t) {
            if t.is_some() {
                plan.unchanged += 1;
            }
            o.map(|n| Resolved::Blob(n.blob))
        } else if blob_of(o) == blob_of(b) {
            match t {
                Some(t) => {
                    plan.added += 1;
                    Some(Resolved::Blob(t.blob))
                }
                None => {
                    tracing::debug!(%commit, "note removed by source");
                    plan.removed += 1;
                    None
                }
            }
        } else if blob_of(t) == blob_of(b) {
            o.map(|n| Resolved::Blob(n.blob))
        } else {
            match (o, t) {
                (Some(o), Some(t)) => {
                    plan.combined += 1;
                    Some(Resolved::Combined(combine_notes(&o.bytes, &t.bytes)))
                }
                (Some(o), None) => Some(Resolved::Blob(o.blob)),
                (None, Some(t)) => {
                    plan.added += 1;
                    Some(Resolved::Blob(t.blob))
                }
                (None, None) => None,
            }
        };
        if let Some(resolved) = resolved {
            plan.notes.insert(commit, resolved);
        }
    }
    plan
}

fn update_target(
    repo: &Repository,
    target_ref: &str,
    new: Oid,
    expected: Oid,
    log: &str,
) -> Result<(), SyncError> {
    match repo.reference_matching(target_ref, new, true, expected, log) {
        Ok(_) => Ok(()),
        Err(e) if matches!(e.code(), ErrorCode::Modified | ErrorCode::Locked) => {
            Err(SyncError::RefMoved {
                name: target_ref.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::notes::NoteStore;
    use crate::git::refs::{NOTES_REF, TRACKING_REF};
    use crate::git::test_support::{commit_file, init_repo};
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn combine_sorts_and_dedupes() {
        assert_eq!(combine_notes(b"b\na\n", b"c\na\n"), b"a\nb\nc\n");
        assert_eq!(combine_notes(b"x", b""), b"x\n");
        assert_eq!(combine_notes(b"", b""), b"");
    }

    proptest! {
        #[test]
        fn combine_is_commutative(a in "[a-c\n]{0,12}", b in "[a-c\n]{0,12}") {
            prop_assert_eq!(
                combine_notes(a.as_bytes(), b.as_bytes()),
                combine_notes(b.as_bytes(), a.as_bytes())
            );
        }

        #[test]
        fn combine_is_idempotent(a in "[a-c\n]{0,12}", b in "[a-c\n]{0,12}") {
            let once = combine_notes(a.as_bytes(), b.as_bytes());
            prop_assert_eq!(combine_notes(&once, b.as_bytes()), once.clone());
            prop_assert_eq!(combine_notes(&once, &once), once);
        }
    }

    /// Two notes refs that share no history, each annotating `c1`, and one
    /// annotating `c2`.
    fn diverged(repo: &Repository) -> (Oid, Oid) {
        let c1 = commit_file(repo, "a.txt", "a", "one");
        let c2 = commit_file(repo, "b.txt", "b", "two");
        let ours = NoteStore::open(repo);
        ours.put(c1, b"{\"session_id\":\"local\"}\n").unwrap();
        let theirs = NoteStore::with_ref(repo, TRACKING_REF);
        theirs.put(c1, b"{\"session_id\":\"remote\"}\n").unwrap();
        theirs.put(c2, b"{\"session_id\":\"other\"}\n").unwrap();
        (c1, c2)
    }

    #[test]
    fn missing_source_is_nothing_to_merge() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        let report = merge_notes_refs(&repo, NOTES_REF, TRACKING_REF).unwrap();
        assert_eq!(report.outcome, MergeOutcome::NothingToMerge);
    }

    #[test]
    fn missing_target_adopts_source() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        let c1 = commit_file(&repo, "a.txt", "a", "one");
        NoteStore::with_ref(&repo, TRACKING_REF)
            .put(c1, b"r\n")
            .unwrap();
        let tracking = repo.refname_to_id(TRACKING_REF).unwrap();

        let report = merge_notes_refs(&repo, NOTES_REF, TRACKING_REF).unwrap();
        assert_eq!(report.outcome, MergeOutcome::Adopted { oid: tracking });
        assert_eq!(report.added, 1);
        assert_eq!(repo.refname_to_id(NOTES_REF).unwrap(), tracking);
    }

    #[test]
    fn descendant_fast_forwards_and_ancestor_is_up_to_date() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        let c1 = commit_file(&repo, "a.txt", "a", "one");
        let c2 = commit_file(&repo, "b.txt", "b", "two");
        let store = NoteStore::open(&repo);
        store.put(c1, b"one\n").unwrap();
        let old = store.tip().unwrap().unwrap();
        store.put(c2, b"two\n").unwrap();
        let new = store.tip().unwrap().unwrap();

        repo.reference(TRACKING_REF, old, true, "test").unwrap();
        let report = merge_notes_refs(&repo, NOTES_REF, TRACKING_REF).unwrap();
        assert_eq!(report.outcome, MergeOutcome::UpToDate);

        repo.reference(NOTES_REF, old, true, "test").unwrap();
        repo.reference(TRACKING_REF, new, true, "test").unwrap();
        let report = merge_notes_refs(&repo, NOTES_REF, TRACKING_REF).unwrap();
        assert_eq!(report.outcome, MergeOutcome::FastForward { from: old, to: new });
        assert_eq!(report.added, 1);
        assert_eq!(repo.refname_to_id(NOTES_REF).unwrap(), new);
    }

    #[test]
    fn concurrent_annotations_are_combined() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        let (c1, c2) = diverged(&repo);
        let local = repo.refname_to_id(NOTES_REF).unwrap();
        let remote = repo.refname_to_id(TRACKING_REF).unwrap();

        let report = merge_notes_refs(&repo, NOTES_REF, TRACKING_REF).unwrap();
        let MergeOutcome::Merged { commit } = report.outcome else {
            panic!("expected merge commit, got {:?}", report.outcome);
        };
        assert_eq!((report.added, report.combined, report.unchanged), (1, 1, 0));

        let merge = repo.find_commit(commit).unwrap();
        assert_eq!(merge.parent_ids().collect::<Vec<_>>(), vec![local, remote]);

        let store = NoteStore::open(&repo);
        assert_eq!(
            store.get(c1).unwrap().unwrap(),
            b"{\"session_id\":\"local\"}\n{\"session_id\":\"remote\"}\n"
        );
        assert_eq!(
            store.get(c2).unwrap().unwrap(),
            b"{\"session_id\":\"other\"}\n"
        );
    }

    /// Both refs start from a notes commit annotating `c1` with `v1`; the
    /// tracking ref then annotates `c2` so the two diverge once the local ref
    /// moves too.
    fn shared_base(repo: &Repository) -> (Oid, Oid) {
        let c1 = commit_file(repo, "a.txt", "a", "one");
        let c2 = commit_file(repo, "b.txt", "b", "two");
        NoteStore::open(repo).put(c1, b"v1\n").unwrap();
        let base = repo.refname_to_id(NOTES_REF).unwrap();
        repo.reference(TRACKING_REF, base, true, "test").unwrap();
        NoteStore::with_ref(repo, TRACKING_REF)
            .put(c2, b"other\n")
            .unwrap();
        (c1, c2)
    }

    #[test]
    fn local_overwrite_survives_merge_with_untouched_remote() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        let (c1, c2) = shared_base(&repo);
        let store = NoteStore::open(&repo);
        store.put(c1, b"v2\n").unwrap();

        let report = merge_notes_refs(&repo, NOTES_REF, TRACKING_REF).unwrap();
        assert!(matches!(report.outcome, MergeOutcome::Merged { .. }));
        assert_eq!((report.added, report.combined, report.removed), (1, 0, 0));
        assert_eq!(store.get(c1).unwrap().unwrap(), b"v2\n");
        assert_eq!(store.get(c2).unwrap().unwrap(), b"other\n");
    }

    #[test]
    fn local_removal_survives_merge_with_untouched_remote() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        let (c1, c2) = shared_base(&repo);
        let store = NoteStore::open(&repo);
        store.remove(c1).unwrap();

        let report = merge_notes_refs(&repo, NOTES_REF, TRACKING_REF).unwrap();
        assert!(matches!(report.outcome, MergeOutcome::Merged { .. }));
        assert_eq!(store.get(c1).unwrap(), None);
        assert_eq!(store.get(c2).unwrap().unwrap(), b"other\n");
    }

    #[test]
    fn remote_removal_and_overwrite_apply_to_untouched_local() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        let c1 = commit_file(&repo, "a.txt", "a", "one");
        let c2 = commit_file(&repo, "b.txt", "b", "two");
        let c3 = commit_file(&repo, "c.txt", "c", "three");
        let store = NoteStore::open(&repo);
        store.put(c1, b"v1\n").unwrap();
        store.put(c2, b"keep\n").unwrap();
        let base = repo.refname_to_id(NOTES_REF).unwrap();
        repo.reference(TRACKING_REF, base, true, "test").unwrap();

        let theirs = NoteStore::with_ref(&repo, TRACKING_REF);
        theirs.put(c1, b"v2\n").unwrap();
        theirs.remove(c2).unwrap();
        store.put(c3, b"local\n").unwrap();

        let report = merge_notes_refs(&repo, NOTES_REF, TRACKING_REF).unwrap();
        assert_eq!((report.added, report.combined, report.removed), (1, 0, 1));
        assert_eq!(store.get(c1).unwrap().unwrap(), b"v2\n");
        assert_eq!(store.get(c2).unwrap(), None);
        assert_eq!(store.get(c3).unwrap().unwrap(), b"local\n");
    }

    #[test]
    fn edits_on_both_sides_of_a_shared_base_are_combined() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        let (c1, _) = shared_base(&repo);
        NoteStore::with_ref(&repo, TRACKING_REF)
            .put(c1, b"remote\n")
            .unwrap();
        let store = NoteStore::open(&repo);
        store.put(c1, b"local\n").unwrap();

        let report = merge_notes_refs(&repo, NOTES_REF, TRACKING_REF).unwrap();
        assert_eq!(report.combined, 1);
        assert_eq!(store.get(c1).unwrap().unwrap(), b"local\nremote\n");
    }

    #[test]
    fn merge_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let repo = init_repo(tmp.path());
        let (c1, _) = diverged(&repo);

        merge_notes_refs(&repo, NOTES_REF, TRACKING_REF).unwrap();
        let after_first = repo.refname_to_id(NOTES_REF).unwrap();
        let body = NoteStore::open(&repo).get(c1).unwrap();

        let report = merge_notes_refs(&repo, NOTES_REF, TRACKING_REF).unwrap();
        assert_eq!(report.outcome, MergeOutcome::UpToDate);
        assert_eq!(repo.refname_to_id(NOTES_REF).unwrap(), after_first);
        assert_eq!(NoteStore::open(&repo).get(c1).unwrap(), body);
    }
}
