use super::super::render::{self, AttachView};
use super::super::{AttachArgs, Ctx, print_view};
use crate::core::{AgentKind, Record, RecordMeta};
use crate::git::NoteStore;
use crate::repo::{resolve_commit, work_tree_root};
use crate::{Error, Result};

pub(crate) fn handle(ctx: &Ctx, args: AttachArgs) -> Result<()> {
    let commit = resolve_commit(&ctx.repo, &args.commit)?;
    let bytes = std::fs::read(&args.transcript).map_err(|source| Error::ReadInput {
        path: args.transcript.clone(),
        source,
    })?;

    // Refuse transcripts the agent's decoder cannot read; `show` would fail later.
    let agent = AgentKind::parse(&args.agent);
    let entries = ctx.registry.decode(&agent, &bytes)?;

    let mut meta = RecordMeta::new(args.session);
    meta.agent = agent;
    meta.model = args.model;
    meta.message_count = entries.len() as u64;
    meta.project_path = work_tree_root(&ctx.repo)
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    meta.git_branch = current_branch(&ctx.repo).unwrap_or_default();

    let record = Record::encode(&bytes, meta)?;
    let note = record.to_note_bytes()?;
    let store = NoteStore::open(&ctx.repo);
    let replaced = store.get(commit)?.is_some_and(|existing| existing != note);
    store.put(commit, &note)?;
    tracing::info!(%commit, session = %record.session_id, entries = entries.len(), "attached");

    let view = AttachView {
        commit: commit.to_string(),
        session_id: record.session_id.clone(),
        agent: record.agent().to_string(),
        message_count: record.message_count,
        checksum: record.checksum.clone(),
        replaced,
    };
    print_view(ctx.json, &view, || render::render_attach(&view))
}

fn current_branch(repo: &git2::Repository) -> Option<String> {
    let head = repo.head().ok()?;
    if !head.is_branch() {
        return None;
    }
    head.shorthand().map(str::to_string)
}
