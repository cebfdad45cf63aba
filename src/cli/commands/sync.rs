use super::super::render;
use super::super::{Ctx, RemoteArgs, print_view};
use crate::Result;
use crate::git::{SyncOptions, pull, push_with_retry};
use crate::progress::Spinner;

fn sync_options(ctx: &Ctx, args: RemoteArgs) -> SyncOptions {
    let mut options = SyncOptions::from(&ctx.config.sync);
    if let Some(remote) = args.remote {
        options.remote = remote;
    }
    options
}

pub(crate) fn handle_push(ctx: &Ctx, args: RemoteArgs) -> Result<()> {
    let options = sync_options(ctx, args);
    let outcome = {
        let _spinner = spinner(ctx, format!("pushing to {}", options.remote));
        push_with_retry(&ctx.repo, &options, ctx.config.sync.max_retries)?
    };
    print_view(ctx.json, &outcome, || {
        render::render_push(&options.remote, &outcome)
    })
}

pub(crate) fn handle_pull(ctx: &Ctx, args: RemoteArgs) -> Result<()> {
    let options = sync_options(ctx, args);
    let report = {
        let _spinner = spinner(ctx, format!("pulling from {}", options.remote));
        pull(&ctx.repo, &options)?
    };
    print_view(ctx.json, &report, || {
        render::render_pull(&options.remote, &report)
    })
}

fn spinner(ctx: &Ctx, label: String) -> Spinner {
    if ctx.json {
        Spinner::disabled()
    } else {
        Spinner::start(label)
    }
}
