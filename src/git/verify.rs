//! Batch integrity check over every attached record.

use git2::Oid;
use serde::Serialize;

use super::error::StoreError;
use super::notes::NoteStore;
use crate::core::{Integrity, decode_note};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordStatus {
    #[serde(serialize_with = "ser_oid")]
    pub commit: Oid,
    pub session_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub notes: usize,
    pub records: usize,
    pub verified: usize,
    pub tampered: usize,
    pub corrupt: usize,
    /// Notes whose body is not a record list at all.
    pub undecodable: usize,
    /// Every record that did not verify, plus undecodable notes.
    pub failures: Vec<RecordStatus>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

fn ser_oid<S: serde::Serializer>(oid: &Oid, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(oid)
}

/// Check every record on the store's ref. Per-note problems are counted and
/// listed; only a failure to read the ref itself is an error.
pub fn verify_all(store: &NoteStore<'_>) -> Result<VerifyReport, StoreError> {
    let mut report = VerifyReport::default();
    for (commit, note) in store.entries()? {
        report.notes += 1;
        let records = match decode_note(&note.bytes) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(%commit, error = %e, "note is not decodable");
                report.undecodable += 1;
                report.failures.push(RecordStatus {
                    commit,
                    session_id: String::new(),
                    status: "undecodable",
                    detail: Some(e.to_string()),
                });
                continue;
            }
        };
        for record in records {
            report.records += 1;
            let integrity = record.integrity();
            tracing::debug!(%commit, session = %record.session_id, status = integrity.as_str(), "checked");
            match integrity {
                Integrity::Verified => report.verified += 1,
                Integrity::Tampered => {
                    report.tampered += 1;
                    report.failures.push(RecordStatus {
                        commit,
                        session_id: record.session_id,
                        status: "tampered",
                        detail: None,
                    });
                }
                Integrity::Corrupt(detail) => {
                    report.corrupt += 1;
                    report.failures.push(RecordStatus {
                        commit,
                        session_id: record.session_id,
                        status: "corrupt",
                        detail: Some(detail),
                    });
                }
            }
        }
    }
    tracing::info!(
        notes = report.notes,
        records = report.records,
        verified = report.verified,
        tampered = report.tampered,
        corrupt = report.corrupt,
        undecodable = report.undecodable,
        "verify complete"
    );
    Ok(report)
}
