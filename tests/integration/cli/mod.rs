mod records;
mod remap;
mod sync;

use std::path::Path;

use assert_cmd::Command;

/// The binary, run inside `repo`, isolated from the caller's config files.
pub fn convo(repo: &Path, home: &Path) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("git-convo");
    cmd.current_dir(repo);
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join("config"));
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env_remove("LOG");
    for var in [
        "GIT_CONVO_DEBUG",
        "GIT_CONVO_REMOTE",
        "GIT_CONVO_SYNC_TIMEOUT_MS",
        "GIT_CONVO_LOG_DIR",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

pub fn json_of(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout is json")
}
