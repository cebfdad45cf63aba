//! Reconciliation: re-attach records whose commits were rewritten.
//!
//! A rebase-style merge elsewhere replaces annotated commits with new ones
//! carrying the same change. The originals drop out of every tracked branch,
//! their records with them. Remap finds those orphans, matches each to a
//! reachable commit with the same patch id, and copies the record across.
//!
//! Matching is deterministic: orphans are visited in ascending id order,
//! candidates keep history walk order, the first candidate per patch id is the
//! only one considered, and each candidate is claimed at most once.

use std::collections::{BTreeSet, HashMap, HashSet};

use git2::{ErrorCode, Oid, Repository};
use serde::Serialize;

use super::error::{RemapError, StoreError};
use super::history;
use super::merge::combine_notes;
use super::notes::NoteStore;
use super::patch_id::{ContentIdentity, PatchId};
use super::refs::refname_to_id_optional;
use crate::config::RemapConfig;

#[derive(Clone, Debug)]
pub struct RemapOptions {
    /// Cap on candidates taken from tracked history.
    pub max_candidates: usize,
    /// Remove the orphan's record once it is safe at its new home.
    pub prune: bool,
    /// Compute the assignment without writing anything.
    pub dry_run: bool,
}

impl Default for RemapOptions {
    fn default() -> Self {
        Self::from(&RemapConfig::default())
    }
}

impl From<&RemapConfig> for RemapOptions {
    fn from(cfg: &RemapConfig) -> Self {
        Self {
            max_candidates: cfg.max_candidates,
            prune: cfg.prune,
            dry_run: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateSource {
    /// `ORIG_HEAD..HEAD`, the commits the last merge or pull brought in.
    RecentMerge {
        #[serde(serialize_with = "ser_oid")]
        from: Oid,
        #[serde(serialize_with = "ser_oid")]
        to: Oid,
    },
    TrackedHistory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Remapped {
    #[serde(serialize_with = "ser_oid")]
    pub from: Oid,
    #[serde(serialize_with = "ser_oid")]
    pub to: Oid,
    /// Destination already had a different record; both were kept.
    pub combined: bool,
}

fn ser_oid<S: serde::Serializer>(oid: &Oid, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(oid)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RemapReport {
    /// Commits carrying a record.
    pub noted: usize,
    /// Noted commits unreachable from every tracked tip.
    pub orphans: usize,
    pub remapped: Vec<Remapped>,
    /// Orphans whose match is the orphan itself.
    pub unchanged: usize,
    /// Orphans whose match already carries the identical record.
    pub already_present: usize,
    /// Orphans whose commit object is gone.
    pub skipped_missing: usize,
    /// Orphans with no matching candidate.
    pub skipped_unmatched: usize,
    pub identity_failures: usize,
    pub candidate_failures: usize,
    pub write_failures: usize,
    pub candidates: usize,
    pub source: Option<CandidateSource>,
    pub pruned: usize,
    pub dry_run: bool,
}

impl RemapReport {
    /// Some orphans could not be re-attached. Informational, never an error.
    pub fn is_partial(&self) -> bool {
        self.skipped_missing + self.skipped_unmatched + self.identity_failures + self.write_failures
            > 0
    }
}

/// Run one remap pass over every orphaned record in `store`.
///
/// The orphan's record is copied to its match. If the match already carries
/// a different record, the two are combined line by line instead of the
/// destination being overwritten, and the entry is reported with
/// `combined: true`. An orphan or candidate whose patch id cannot be computed
/// is counted and skipped; only failures to read the store or history abort
/// the pass.
pub fn remap<I>(
    repo: &Repository,
    store: &NoteStore<'_>,
    identity: &I,
    options: &RemapOptions,
) -> Result<RemapReport, RemapError>
where
    I: ContentIdentity + ?Sized,
{
    let mut report = RemapReport {
        dry_run: options.dry_run,
        ..RemapReport::default()
    };

    let noted = store.annotated()?;
    report.noted = noted.len();
    if noted.is_empty() {
        return Ok(report);
    }

    let reachable: HashSet<Oid> = history::tracked_history(repo)?.into_iter().collect();
    let orphans: BTreeSet<Oid> = noted
        .into_iter()
        .filter(|oid| !reachable.contains(oid))
        .collect();
    report.orphans = orphans.len();

    let mut pending: Vec<(Oid, PatchId)> = Vec::with_capacity(orphans.len());
    for orphan in orphans {
        match repo.find_commit(orphan) {
            Ok(_) => {}
            Err(e) if e.code() == ErrorCode::NotFound => {
                tracing::debug!(%orphan, "orphan commit object is gone");
                report.skipped_missing += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
        match identity.patch_id(repo, orphan) {
            Ok(Some(id)) => pending.push((orphan, id)),
            Ok(None) => {
                tracing::debug!(%orphan, "orphan introduces no change");
                report.skipped_unmatched += 1;
            }
            Err(e) => {
                tracing::warn!(%orphan, error = %e, "cannot compute patch id for orphan");
                report.identity_failures += 1;
            }
        }
    }

    if pending.is_empty() {
        log_summary(&report);
        return Ok(report);
    }

    let (source, candidates) = candidates(repo, options.max_candidates)?;
    report.source = Some(source);
    report.candidates = candidates.len();

    let mut by_patch_id: HashMap<PatchId, Oid> = HashMap::new();
    for candidate in candidates {
        match identity.patch_id(repo, candidate) {
            Ok(Some(id)) => {
                by_patch_id.entry(id).or_insert(candidate);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(%candidate, error = %e, "skipping candidate");
                report.candidate_failures += 1;
            }
        }
    }

    let mut claimed: HashSet<Oid> = HashSet::new();
    for (orphan, id) in pending {
        let Some(&target) = by_patch_id.get(&id) else {
            tracing::debug!(%orphan, patch_id = %id, "no rewritten counterpart");
            report.skipped_unmatched += 1;
            continue;
        };
        if !claimed.insert(target) {
            tracing::debug!(%orphan, %target, "counterpart already claimed");
            report.skipped_unmatched += 1;
            continue;
        }
        if target == orphan {
            report.unchanged += 1;
            continue;
        }

        match reattach(store, orphan, target, options) {
            Ok(Reattached::AlreadyPresent) => {
                report.already_present += 1;
                if prune_orphan(store, orphan, options) {
                    report.pruned += 1;
                }
            }
            Ok(Reattached::Copied { combined }) => {
                tracing::debug!(from = %orphan, to = %target, combined, "remapped record");
                report.remapped.push(Remapped {
                    from: orphan,
                    to: target,
                    combined,
                });
                if prune_orphan(store, orphan, options) {
                    report.pruned += 1;
                }
            }
            Err(e) => {
                tracing::warn!(from = %orphan, to = %target, error = %e, "failed to remap record");
                report.write_failures += 1;
            }
        }
    }

    log_summary(&report);
    Ok(report)
}

enum Reattached {
    AlreadyPresent,
    Copied { combined: bool },
}

fn reattach(
    store: &NoteStore<'_>,
    orphan: Oid,
    target: Oid,
    options: &RemapOptions,
) -> Result<Reattached, StoreError> {
    let source = store
        .get(orphan)?
        .ok_or(StoreError::MissingNote(orphan))?;
    let (body, combined) = match store.get(target)? {
        Some(existing) if existing == source => return Ok(Reattached::AlreadyPresent),
        Some(existing) => {
            let body = combine_notes(&existing, &source);
            if body == existing {
                return Ok(Reattached::AlreadyPresent);
            }
            (body, true)
        }
        None => (source, false),
    };
    if !options.dry_run {
        store.put(target, &body)?;
    }
    Ok(Reattached::Copied { combined })
}

fn prune_orphan(store: &NoteStore<'_>, orphan: Oid, options: &RemapOptions) -> bool {
    if !options.prune || options.dry_run {
        return false;
    }
    match store.remove(orphan) {
        Ok(removed) => removed,
        Err(e) => {
            tracing::warn!(%orphan, error = %e, "failed to prune orphaned record");
            false
        }
    }
}

/// `ORIG_HEAD..HEAD` when that range exists and is non-empty, otherwise the
/// tracked history capped at `max`.
fn candidates(repo: &Repository, max: usize) -> Result<(CandidateSource, Vec<Oid>), RemapError> {
    let head = repo.head().ok().and_then(|h| h.target());
    if let (Some(orig), Some(head)) = (refname_to_id_optional(repo, "ORIG_HEAD")?, head)
        && orig != head
        && let Ok(range) = history::walk(repo, &[head], &[orig])
        && !range.is_empty()
    {
        return Ok((CandidateSource::RecentMerge { from: orig, to: head }, range));
    }

    let mut all = history::tracked_history(repo)?;
    all.truncate(max);
    Ok((CandidateSource::TrackedHistory, all))
}

fn log_summary(report: &RemapReport) {
    tracing::info!(
        noted = report.noted,
        orphans = report.orphans,
        remapped = report.remapped.len(),
        already_present = report.already_present,
        skipped_missing = report.skipped_missing,
        skipped_unmatched = report.skipped_unmatched,
        identity_failures = report.identity_failures,
        pruned = report.pruned,
        dry_run = report.dry_run,
        "remap complete"
    );
}
