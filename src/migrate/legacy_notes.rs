//! Move records from `refs/notes/conversations` to the current notes ref.

use git2::{ErrorCode, Oid, Repository};
use serde::Serialize;
use thiserror::Error;

use crate::error::{Effect, Transience};
use crate::git::refs::{LEGACY_NOTES_REF, NOTES_REF, delete_ref, refname_to_id_optional};
use crate::git::{MergeReport, SyncError, merge_notes_refs};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MigrateError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
}

impl MigrateError {
    pub fn transience(&self) -> Transience {
        match self {
            MigrateError::Sync(e) => e.transience(),
            MigrateError::Git(_) => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            MigrateError::Sync(e) => e.effect(),
            MigrateError::Git(_) => Effect::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MigrationOutcome {
    NothingToMigrate,
    /// Only the legacy ref existed; the current ref now points at it.
    Renamed {
        #[serde(serialize_with = "ser_oid")]
        oid: Oid,
    },
    /// Both refs existed and were merged with the sync combine rule.
    Merged { report: MergeReport },
}

fn ser_oid<S: serde::Serializer>(oid: &Oid, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(oid)
}

/// Fold the legacy notes ref into the current one, then delete it.
///
/// Safe to run repeatedly: once the legacy ref is gone it is a no-op.
pub fn migrate_legacy_notes(repo: &Repository) -> Result<MigrationOutcome, MigrateError> {
    let Some(legacy) = refname_to_id_optional(repo, LEGACY_NOTES_REF)? else {
        return Ok(MigrationOutcome::NothingToMigrate);
    };

    let outcome = match refname_to_id_optional(repo, NOTES_REF)? {
        None => match repo.reference(NOTES_REF, legacy, false, "migrate legacy notes") {
            Ok(_) => MigrationOutcome::Renamed { oid: legacy },
            // Someone created the current ref meanwhile; merge instead.
            Err(e) if e.code() == ErrorCode::Exists => MigrationOutcome::Merged {
                report: merge_notes_refs(repo, NOTES_REF, LEGACY_NOTES_REF)?,
            },
            Err(e) => return Err(e.into()),
        },
        Some(_) => MigrationOutcome::Merged {
            report: merge_notes_refs(repo, NOTES_REF, LEGACY_NOTES_REF)?,
        },
    };

    delete_ref(repo, LEGACY_NOTES_REF)?;
    tracing::info!(?outcome, "migrated legacy notes");
    Ok(outcome)
}
