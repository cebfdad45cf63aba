use super::super::render;
use super::super::{Ctx, print_view};
use crate::Result;
use crate::git::{NoteStore, verify_all};

pub(crate) fn handle(ctx: &Ctx) -> Result<()> {
    let report = verify_all(&NoteStore::open(&ctx.repo))?;
    print_view(ctx.json, &report, || render::render_verify(&report))
}
