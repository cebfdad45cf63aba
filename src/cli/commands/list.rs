use super::super::render::{self, ListItem, RecordSummary};
use super::super::{Ctx, print_view};
use crate::Result;
use crate::core::{decode_note, select_latest};
use crate::git::NoteStore;

pub(crate) fn handle(ctx: &Ctx) -> Result<()> {
    let store = NoteStore::open(&ctx.repo);
    let mut items = Vec::new();
    for commit in store.list()? {
        let Some(bytes) = store.get(commit)? else {
            continue;
        };
        let item = match decode_note(&bytes) {
            Ok(records) => match select_latest(&records) {
                Some(record) => ListItem::Ok(RecordSummary::new(commit, record, records.len())),
                None => continue,
            },
            Err(e) => {
                tracing::warn!(%commit, error = %e, "listing undecodable note");
                ListItem::Undecodable {
                    commit: commit.to_string(),
                    error: e.to_string(),
                }
            }
        };
        items.push(item);
    }
    print_view(ctx.json, &items, || render::render_list(&items))
}
