use std::time::Duration;

use git_convo::git::remote::server_timeout_millis;
use git_convo::{cli, config, repo, telemetry};

fn main() {
    let cli = cli::parse_from(std::env::args_os());

    let config = load_config(&cli);
    let _telemetry_guard = telemetry::init(telemetry::TelemetryConfig::new(
        cli.verbose,
        config.debug,
        config.logging.clone(),
    ));
    set_server_timeouts(Duration::from_millis(config.sync.timeout_ms));

    if let Err(e) = cli::run(cli, config) {
        tracing::debug!(transience = ?e.transience(), effect = e.effect().as_str(), "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Repo-local config needs the work tree root; outside a repository only the
/// user file and environment apply.
fn load_config(cli: &cli::Cli) -> config::Config {
    let root = repo::discover(cli.repo.as_deref())
        .ok()
        .and_then(|r| repo::work_tree_root(&r));
    config::load_or_default(root.as_deref())
}

/// Bound connects and stalled reads, which never reach the progress
/// callbacks that enforce the sync deadline.
fn set_server_timeouts(timeout: Duration) {
    let ms = server_timeout_millis(timeout);
    // SAFETY: CLI is single-threaded at this point and no remote operation
    // has started, so nothing reads libgit2's options concurrently.
    let result = unsafe {
        git2::opts::set_server_connect_timeout_in_milliseconds(ms)
            .and_then(|()| git2::opts::set_server_timeout_in_milliseconds(ms))
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "server timeouts not set");
    }
}
