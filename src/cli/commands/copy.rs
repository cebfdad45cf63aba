use super::super::render::{self, CopyView};
use super::super::{CopyArgs, Ctx, print_view};
use crate::Result;
use crate::git::NoteStore;
use crate::repo::resolve_commit;

pub(crate) fn handle(ctx: &Ctx, args: CopyArgs) -> Result<()> {
    let from = resolve_commit(&ctx.repo, &args.from)?;
    let to = resolve_commit(&ctx.repo, &args.to)?;
    NoteStore::open(&ctx.repo).copy(from, to)?;
    tracing::info!(%from, %to, "copied record");

    let view = CopyView {
        from: from.to_string(),
        to: to.to_string(),
    };
    print_view(ctx.json, &view, || render::render_copy(&view))
}
