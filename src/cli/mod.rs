//! CLI surface for git-convo.
//!
//! Thin handlers over the library: each command opens the repository, calls
//! one capability, and prints either a human summary or JSON.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use git2::Repository;
use serde::Serialize;

use crate::config::Config;
use crate::core::AgentRegistry;
use crate::{Error, Result};

mod commands;
mod render;

// =============================================================================
// Entry + global options
// =============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "git-convo",
    version,
    about = "Keep AI coding-agent conversations attached to the commits they produced",
    infer_subcommands = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Machine-readable JSON output.
    #[arg(long, global = true)]
    pub json: bool,

    /// Repository path (default: discover from cwd).
    #[arg(long, global = true, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// More log output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Attach a transcript file to a commit.
    Attach(AttachArgs),

    /// Show the record attached to a commit.
    Show(ShowArgs),

    /// List commits that carry a record.
    #[command(alias = "ls")]
    List,

    /// Check every record's checksum.
    Verify,

    /// Copy one commit's record onto another.
    #[command(alias = "cp")]
    Copy(CopyArgs),

    /// Push local records to the remote.
    Push(RemoteArgs),

    /// Fetch remote records and merge them into the local ones.
    Pull(RemoteArgs),

    /// Re-attach records orphaned by a rebase, amend or squash.
    Remap(RemapArgs),

    /// Fold records from the legacy notes ref into the current one.
    Migrate,
}

#[derive(Args, Debug)]
pub struct AttachArgs {
    /// Transcript file in the agent's native format.
    #[arg(value_name = "FILE")]
    pub transcript: PathBuf,

    /// Agent session id.
    #[arg(long, short = 's', value_name = "ID")]
    pub session: String,

    /// Agent that wrote the transcript.
    #[arg(long, default_value = "claude-code")]
    pub agent: String,

    #[arg(long)]
    pub model: Option<String>,

    /// Commit to attach to.
    #[arg(long, short = 'c', default_value = "HEAD", value_name = "REV")]
    pub commit: String,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(default_value = "HEAD", value_name = "REV")]
    pub commit: String,

    /// Print the transcript entries, not just the record summary.
    #[arg(long, short = 't')]
    pub transcript: bool,

    /// Only entries newer than the parent commit's record of the same session.
    #[arg(long, short = 'i')]
    pub incremental: bool,
}

#[derive(Args, Debug)]
pub struct CopyArgs {
    #[arg(value_name = "FROM")]
    pub from: String,

    #[arg(value_name = "TO")]
    pub to: String,
}

#[derive(Args, Debug)]
pub struct RemoteArgs {
    /// Remote name (default: `sync.remote` from config).
    #[arg(long, value_name = "NAME")]
    pub remote: Option<String>,
}

#[derive(Args, Debug)]
pub struct RemapArgs {
    /// Remove each orphan's record once it has been re-attached.
    #[arg(long)]
    pub prune: bool,

    /// Report what would change without writing.
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Cap on commits searched for matches.
    #[arg(long, value_name = "N")]
    pub max_candidates: Option<usize>,
}

// =============================================================================
// Public API
// =============================================================================

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

/// Run the CLI (used by bin). `config` is loaded by the caller so logging can
/// be set up before any command runs.
pub fn run(cli: Cli, config: Config) -> Result<()> {
    let repo = crate::repo::discover(cli.repo.as_deref())?;
    let ctx = Ctx {
        repo,
        json: cli.json,
        config,
        registry: AgentRegistry::builtin(),
    };

    match cli.command {
        Commands::Attach(args) => commands::attach::handle(&ctx, args),
        Commands::Show(args) => commands::show::handle(&ctx, args),
        Commands::List => commands::list::handle(&ctx),
        Commands::Verify => commands::verify::handle(&ctx),
        Commands::Copy(args) => commands::copy::handle(&ctx, args),
        Commands::Push(args) => commands::sync::handle_push(&ctx, args),
        Commands::Pull(args) => commands::sync::handle_pull(&ctx, args),
        Commands::Remap(args) => commands::remap::handle(&ctx, args),
        Commands::Migrate => commands::migrate::handle(&ctx),
    }
}

// =============================================================================
// Context + helpers
// =============================================================================

struct Ctx {
    repo: Repository,
    json: bool,
    config: Config,
    registry: AgentRegistry,
}

/// Print `payload` as pretty JSON, or `human` otherwise.
fn print_view<T: Serialize>(json: bool, payload: &T, human: impl FnOnce() -> String) -> Result<()> {
    let s = if json {
        serde_json::to_string_pretty(payload)?
    } else {
        human()
    };
    write_stdout(&s)
}

fn write_stdout(s: &str) -> Result<()> {
    use std::io::Write;
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{s}")
        && e.kind() != std::io::ErrorKind::BrokenPipe
    {
        return Err(Error::Output(e));
    }
    Ok(())
}
