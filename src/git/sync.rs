//! Sync typestate machine for the notes ref.
//!
//! Implements the pull half of the protocol with typestate guarantees:
//! - Idle → Fetched → Merged → Idle
//! - Each transition consumes `self`, returns next phase
//! - Can't skip steps - enforced at compile time
//!
//! Key design:
//! - Fetch only ever writes the tracking ref; the local ref moves only in
//!   merge, by compare-and-swap
//! - An interrupted pull leaves the tracking ref behind; `resume` picks it up
//!   and re-merging it is a no-op when it was already merged
//! - Push never forces; a moved remote is reported as divergence and the
//!   retry loop lives in [`push_with_retry`], outside the machine

use std::time::{Duration, Instant};

use git2::{Oid, Repository};
use serde::Serialize;

use super::error::SyncError;
use super::merge::{MergeOutcome, MergeReport, merge_notes_refs};
use super::refs::{NOTES_REF, TRACKING_REF, delete_ref, refname_to_id_optional};
use super::remote::{Deadline, fetch_notes, push_notes};
use crate::config::SyncConfig;

/// Where and how long to talk to the remote.
#[derive(Clone, Debug)]
pub struct SyncOptions {
    pub remote: String,
    pub timeout: Duration,
}

impl SyncOptions {
    pub fn new(remote: impl Into<String>, timeout: Duration) -> Self {
        Self {
            remote: remote.into(),
            timeout,
        }
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(cfg: &SyncConfig) -> Self {
        Self::new(cfg.remote.clone(), Duration::from_millis(cfg.timeout_ms))
    }
}

// =============================================================================
// Phase markers
// =============================================================================

/// Initial phase - nothing fetched.
pub struct Idle;

/// Remote notes sit in the tracking ref, local notes untouched.
pub struct Fetched {
    /// Local notes tip when the fetch completed.
    pub local_oid: Option<Oid>,
    /// Tracking ref tip; `None` when the remote had no notes.
    pub tracking_oid: Option<Oid>,
    /// Whether this phase was rebuilt from a leftover tracking ref.
    pub resumed: bool,
}

/// Tracking notes merged into the local ref.
pub struct Merged {
    pub report: MergeReport,
}

/// Sync process with typestate-enforced phases.
///
/// ```ignore
/// let report = SyncProcess::new(options)
///     .fetch(&repo)?
///     .merge(&repo)?
///     .finish(&repo)?;
/// ```
pub struct SyncProcess<Phase> {
    pub options: SyncOptions,
    pub phase: Phase,
}

impl SyncProcess<Idle> {
    pub fn new(options: SyncOptions) -> Self {
        SyncProcess {
            options,
            phase: Idle,
        }
    }

    /// Phase 1: force-fetch the remote notes ref into the tracking ref.
    pub fn fetch(self, repo: &Repository) -> Result<SyncProcess<Fetched>, SyncError> {
        let deadline = Deadline::after(self.options.timeout);
        let found = fetch_notes(repo, &self.options.remote, deadline)?;
        let tracking_oid = if found {
            refname_to_id_optional(repo, TRACKING_REF)?
        } else {
            None
        };
        let local_oid = refname_to_id_optional(repo, NOTES_REF)?;
        tracing::debug!(
            remote = %self.options.remote,
            tracking = ?tracking_oid,
            local = ?local_oid,
            elapsed_ms = deadline.elapsed().as_millis() as u64,
            "fetched notes"
        );
        Ok(SyncProcess {
            options: self.options,
            phase: Fetched {
                local_oid,
                tracking_oid,
                resumed: false,
            },
        })
    }

    /// Rebuild the fetched phase from a tracking ref an interrupted pull left
    /// behind. `None` when there is nothing to resume.
    pub fn resume(self, repo: &Repository) -> Result<Option<SyncProcess<Fetched>>, SyncError> {
        let Some(tracking_oid) = refname_to_id_optional(repo, TRACKING_REF)? else {
            return Ok(None);
        };
        tracing::info!(tracking = %tracking_oid, "resuming interrupted pull");
        Ok(Some(SyncProcess {
            options: self.options,
            phase: Fetched {
                local_oid: refname_to_id_optional(repo, NOTES_REF)?,
                tracking_oid: Some(tracking_oid),
                resumed: true,
            },
        }))
    }
}

impl SyncProcess<Fetched> {
    /// Phase 2: combine tracking into local.
    pub fn merge(self, repo: &Repository) -> Result<SyncProcess<Merged>, SyncError> {
        let report = match self.phase.tracking_oid {
            Some(_) => merge_notes_refs(repo, NOTES_REF, TRACKING_REF)?,
            None => MergeReport::bare(MergeOutcome::NothingToMerge),
        };
        Ok(SyncProcess {
            options: self.options,
            phase: Merged { report },
        })
    }

    pub fn resumed(&self) -> bool {
        self.phase.resumed
    }
}

impl SyncProcess<Merged> {
    /// Clear the tracking ref, returning to idle.
    pub fn finish(self, repo: &Repository) -> Result<MergeReport, SyncError> {
        delete_ref(repo, TRACKING_REF)?;
        Ok(self.phase.report)
    }
}

/// Full pull: finish any interrupted pull first, then fetch and merge.
pub fn pull(repo: &Repository, options: &SyncOptions) -> Result<MergeReport, SyncError> {
    let started = Instant::now();
    if let Some(resumed) = SyncProcess::new(options.clone()).resume(repo)? {
        let report = resumed.merge(repo)?.finish(repo)?;
        tracing::debug!(outcome = ?report.outcome, "merged leftover tracking notes");
    }

    let report = SyncProcess::new(options.clone())
        .fetch(repo)?
        .merge(repo)?
        .finish(repo)?;
    tracing::info!(
        remote = %options.remote,
        outcome = ?report.outcome,
        added = report.added,
        combined = report.combined,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "pull complete"
    );
    Ok(report)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PushOutcome {
    /// No local notes exist yet.
    NothingToPush,
    Pushed {
        #[serde(serialize_with = "ser_oid")]
        oid: Oid,
        retries: usize,
    },
}

fn ser_oid<S: serde::Serializer>(oid: &Oid, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(oid)
}

/// Push the local notes ref once. Divergence is returned, not retried.
pub fn push(repo: &Repository, options: &SyncOptions) -> Result<PushOutcome, SyncError> {
    let Some(oid) = refname_to_id_optional(repo, NOTES_REF)? else {
        // Nothing local, but an unknown remote is still an error.
        repo.find_remote(&options.remote)
            .map_err(|_| SyncError::NoRemote(options.remote.clone()))?;
        return Ok(PushOutcome::NothingToPush);
    };
    push_notes(repo, &options.remote, Deadline::after(options.timeout))?;
    tracing::debug!(remote = %options.remote, %oid, "pushed notes");
    Ok(PushOutcome::Pushed { oid, retries: 0 })
}

/// Push, and on divergence pull, merge and push again, up to `max_retries`
/// times.
pub fn push_with_retry(
    repo: &Repository,
    options: &SyncOptions,
    max_retries: usize,
) -> Result<PushOutcome, SyncError> {
    let started = Instant::now();
    let mut retries = 0;

    loop {
        match push(repo, options) {
            Ok(PushOutcome::Pushed { oid, .. }) => {
                tracing::info!(
                    remote = %options.remote,
                    %oid,
                    retries,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "push complete"
                );
                return Ok(PushOutcome::Pushed { oid, retries });
            }
            Ok(outcome) => return Ok(outcome),
            Err(e) if e.is_diverged() => {
                retries += 1;
                if retries > max_retries {
                    return Err(SyncError::TooManyRetries(retries));
                }
                tracing::info!(remote = %options.remote, retries, "remote notes moved; pulling");
                pull(repo, options)?;
            }
            Err(e) => return Err(e),
        }
    }
}
