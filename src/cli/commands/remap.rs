use super::super::render;
use super::super::{Ctx, RemapArgs, print_view};
use crate::Result;
use crate::git::{DiffPatchId, NoteStore, RemapOptions, remap};

pub(crate) fn handle(ctx: &Ctx, args: RemapArgs) -> Result<()> {
    let mut options = RemapOptions::from(&ctx.config.remap);
    options.prune |= args.prune;
    options.dry_run = args.dry_run;
    if let Some(max) = args.max_candidates {
        options.max_candidates = max;
    }

    let store = NoteStore::open(&ctx.repo);
    let report = remap(&ctx.repo, &store, &DiffPatchId, &options)?;
    print_view(ctx.json, &report, || render::render_remap(&report))
}
