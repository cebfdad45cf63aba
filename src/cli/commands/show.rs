use super::super::render::{self, BoundaryView, RecordSummary, ShowView};
use super::super::{Ctx, ShowArgs, print_view};
use crate::Result;
use crate::core::{decode_note, select_latest};
use crate::git::{NoteStore, StoreError, resolve_incremental};
use crate::repo::resolve_commit;

pub(crate) fn handle(ctx: &Ctx, args: ShowArgs) -> Result<()> {
    let commit = resolve_commit(&ctx.repo, &args.commit)?;
    let store = NoteStore::open(&ctx.repo);
    let bytes = store.get(commit)?.ok_or(StoreError::MissingNote(commit))?;
    let records = decode_note(&bytes)?;
    let record = select_latest(&records).ok_or(StoreError::MissingNote(commit))?;
    let summary = RecordSummary::new(commit, record, records.len());

    let view = if args.incremental {
        let inc = resolve_incremental(&ctx.repo, &store, &ctx.registry, commit)?
            .ok_or(StoreError::MissingNote(commit))?;
        ShowView {
            summary,
            boundary: Some(BoundaryView::from(&inc.boundary)),
            entries: Some(inc.entries),
        }
    } else if args.transcript {
        let entries = ctx
            .registry
            .decode(&record.agent(), &record.transcript_bytes()?)?;
        ShowView {
            summary,
            boundary: None,
            entries: Some(entries),
        }
    } else {
        ShowView {
            summary,
            boundary: None,
            entries: None,
        }
    };
    print_view(ctx.json, &view, || render::render_show(&view))
}
