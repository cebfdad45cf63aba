//! Human renderer for CLI outputs, plus the view shapes shared with `--json`.
//!
//! This module is pure formatting; handlers gather the data.

use git2::Oid;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use crate::core::{ContentBlock, Entry, Record, Role, ToolOutput};
use crate::git::{Boundary, MergeOutcome, MergeReport, PushOutcome, RemapReport, VerifyReport};
use crate::migrate::MigrationOutcome;

const PREVIEW_CHARS: usize = 160;

#[derive(Debug, Serialize)]
pub struct RecordSummary {
    pub commit: String,
    pub session_id: String,
    pub timestamp: String,
    pub agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub message_count: u64,
    pub integrity: &'static str,
    /// Records in the note; more than one after a concurrent-annotation merge.
    pub records: usize,
}

impl RecordSummary {
    pub fn new(commit: Oid, record: &Record, records: usize) -> Self {
        Self {
            commit: commit.to_string(),
            session_id: record.session_id.clone(),
            timestamp: record
                .timestamp
                .format(&Rfc3339)
                .unwrap_or_else(|_| record.timestamp.to_string()),
            agent: record.agent().to_string(),
            model: record.model.clone(),
            message_count: record.message_count,
            integrity: record.integrity().as_str(),
            records,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShowView {
    #[serde(flatten)]
    pub summary: RecordSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<Entry>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundaryView {
    Undefined,
    At { parent: String, last_entry_id: String },
}

impl From<&Boundary> for BoundaryView {
    fn from(boundary: &Boundary) -> Self {
        match boundary {
            Boundary::Undefined => BoundaryView::Undefined,
            Boundary::At {
                parent,
                last_entry_id,
            } => BoundaryView::At {
                parent: parent.to_string(),
                last_entry_id: last_entry_id.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttachView {
    pub commit: String,
    pub session_id: String,
    pub agent: String,
    pub message_count: u64,
    pub checksum: String,
    /// The commit already carried a different record.
    pub replaced: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ListItem {
    Ok(RecordSummary),
    Undecodable { commit: String, error: String },
}

#[derive(Debug, Serialize)]
pub struct CopyView {
    pub from: String,
    pub to: String,
}

// -----------------------------------------------------------------------------
// Renderers
// -----------------------------------------------------------------------------

pub fn render_summary(s: &RecordSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("commit   {}\n", s.commit));
    out.push_str(&format!("session  {}\n", s.session_id));
    out.push_str(&format!("agent    {}", s.agent));
    if let Some(model) = &s.model {
        out.push_str(&format!(" ({model})"));
    }
    out.push('\n');
    out.push_str(&format!("time     {}\n", s.timestamp));
    out.push_str(&format!("messages {}\n", s.message_count));
    out.push_str(&format!("checksum {}", s.integrity));
    if s.records > 1 {
        out.push_str(&format!("\nrecords  {} (showing newest)", s.records));
    }
    out
}

pub fn render_show(view: &ShowView) -> String {
    let mut out = render_summary(&view.summary);
    if let Some(boundary) = &view.boundary {
        match boundary {
            BoundaryView::Undefined => out.push_str("\nsince    (start of session)"),
            BoundaryView::At {
                parent,
                last_entry_id,
            } => out.push_str(&format!(
                "\nsince    {last_entry_id} in {}",
                short(parent)
            )),
        }
    }
    if let Some(entries) = &view.entries {
        out.push('\n');
        if entries.is_empty() {
            out.push_str("\n(no new entries)");
        }
        for entry in entries {
            out.push('\n');
            out.push_str(&render_entry(entry));
        }
    }
    out
}

pub fn render_entry(entry: &Entry) -> String {
    let role = match entry.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    };
    let mut out = format!("[{role}] {}", entry.id);
    for block in &entry.blocks {
        out.push_str("\n  ");
        out.push_str(&render_block(block));
    }
    out
}

fn render_block(block: &ContentBlock) -> String {
    match block {
        ContentBlock::Text { text } => preview(text),
        ContentBlock::Thinking { thinking } => format!("(thinking) {}", preview(thinking)),
        ContentBlock::ToolUse { name, .. } => format!("→ {name}"),
        ContentBlock::ToolResult {
            content, is_error, ..
        } => {
            let text = match content {
                ToolOutput::Text(text) => preview(text),
                ToolOutput::Parts(parts) => format!("{} part(s)", parts.len()),
            };
            if *is_error {
                format!("← error: {text}")
            } else {
                format!("← {text}")
            }
        }
        ContentBlock::Unsupported => "(unsupported block)".to_string(),
    }
}

pub fn render_list(items: &[ListItem]) -> String {
    if items.is_empty() {
        return "No records.".to_string();
    }
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match item {
            ListItem::Ok(s) => {
                out.push_str(&format!(
                    "{}  {}  {}  {} msgs  {}",
                    short(&s.commit),
                    s.timestamp,
                    s.agent,
                    s.message_count,
                    s.session_id
                ));
                if s.integrity != "verified" {
                    out.push_str(&format!("  [{}]", s.integrity));
                }
            }
            ListItem::Undecodable { commit, error } => {
                out.push_str(&format!("{}  undecodable: {error}", short(commit)));
            }
        }
    }
    out
}

pub fn render_attach(view: &AttachView) -> String {
    let verb = if view.replaced { "Replaced" } else { "Attached" };
    format!(
        "✓ {verb} record for session {} on {} ({} messages)",
        view.session_id,
        short(&view.commit),
        view.message_count
    )
}

pub fn render_copy(view: &CopyView) -> String {
    format!("✓ Copied record {} → {}", short(&view.from), short(&view.to))
}

pub fn render_verify(report: &VerifyReport) -> String {
    let mut out = format!(
        "{} notes, {} records: {} verified, {} tampered, {} corrupt, {} undecodable",
        report.notes,
        report.records,
        report.verified,
        report.tampered,
        report.corrupt,
        report.undecodable
    );
    for failure in &report.failures {
        out.push_str(&format!(
            "\n  {} {}",
            short(&failure.commit.to_string()),
            failure.status
        ));
        if !failure.session_id.is_empty() {
            out.push_str(&format!(" session={}", failure.session_id));
        }
        if let Some(detail) = &failure.detail {
            out.push_str(&format!(": {detail}"));
        }
    }
    out
}

pub fn render_push(remote: &str, outcome: &PushOutcome) -> String {
    match outcome {
        PushOutcome::NothingToPush => "Nothing to push.".to_string(),
        PushOutcome::Pushed { oid, retries } => {
            let mut out = format!("✓ Pushed {} to {remote}", short(&oid.to_string()));
            if *retries > 0 {
                out.push_str(&format!(" after {retries} retr{}", plural_y(*retries)));
            }
            out
        }
    }
}

pub fn render_pull(remote: &str, report: &MergeReport) -> String {
    let head = match report.outcome {
        MergeOutcome::NothingToMerge => return format!("No records on {remote}."),
        MergeOutcome::UpToDate => return "Already up to date.".to_string(),
        MergeOutcome::Adopted { oid } => {
            format!("✓ Adopted {remote} records at {}", short(&oid.to_string()))
        }
        MergeOutcome::FastForward { to, .. } => {
            format!("✓ Fast-forwarded to {}", short(&to.to_string()))
        }
        MergeOutcome::Merged { commit } => {
            format!("✓ Merged {remote} records in {}", short(&commit.to_string()))
        }
    };
    let mut out = format!(
        "{head} ({} added, {} combined, {} unchanged",
        report.added, report.combined, report.unchanged
    );
    if report.removed > 0 {
        out.push_str(&format!(", {} removed", report.removed));
    }
    out.push(')');
    out
}

pub fn render_remap(report: &RemapReport) -> String {
    if report.orphans == 0 {
        return format!("No orphaned records ({} noted commits).", report.noted);
    }
    let verb = if report.dry_run { "Would remap" } else { "Remapped" };
    let mut out = format!(
        "{verb} {} of {} orphaned record(s) using {} candidate(s)",
        report.remapped.len(),
        report.orphans,
        report.candidates
    );
    for r in &report.remapped {
        out.push_str(&format!(
            "\n  {} → {}",
            short(&r.from.to_string()),
            short(&r.to.to_string())
        ));
        if r.combined {
            out.push_str(" (combined)");
        }
    }
    if report.already_present > 0 {
        out.push_str(&format!("\n  {} already present", report.already_present));
    }
    if report.pruned > 0 {
        out.push_str(&format!("\n  {} pruned", report.pruned));
    }
    if report.is_partial() {
        out.push_str(&format!(
            "\n  partial: {} unmatched, {} missing, {} identity failures, {} write failures",
            report.skipped_unmatched,
            report.skipped_missing,
            report.identity_failures,
            report.write_failures
        ));
    }
    out
}

pub fn render_migrate(outcome: &MigrationOutcome) -> String {
    match outcome {
        MigrationOutcome::NothingToMigrate => "Nothing to migrate.".to_string(),
        MigrationOutcome::Renamed { oid } => {
            format!("✓ Moved legacy records ({})", short(&oid.to_string()))
        }
        MigrationOutcome::Merged { report } => format!(
            "✓ Merged legacy records ({} added, {} combined, {} unchanged)",
            report.added, report.combined, report.unchanged
        ),
    }
}

fn short(id: &str) -> &str {
    id.get(..10).unwrap_or(id)
}

fn plural_y(n: usize) -> &'static str {
    if n == 1 { "y" } else { "ies" }
}

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or("");
    let mut chars = line.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() || text.lines().nth(1).is_some() {
        format!("{head}…")
    } else {
        head
    }
}
