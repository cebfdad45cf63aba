use super::super::render;
use super::super::{Ctx, print_view};
use crate::Result;
use crate::migrate::migrate_legacy_notes;

pub(crate) fn handle(ctx: &Ctx) -> Result<()> {
    let outcome = migrate_legacy_notes(&ctx.repo)?;
    print_view(ctx.json, &outcome, || render::render_migrate(&outcome))
}
