//! XDG directory helpers for config/data locations.

use std::path::PathBuf;

const APP_DIR: &str = "git-convo";

fn xdg_or_home(var: &str, fallback: &[&str]) -> PathBuf {
    std::env::var(var)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            fallback.iter().fold(
                dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp")),
                |path, part| path.join(part),
            )
        })
        .join(APP_DIR)
}

/// Base directory for configuration files.
///
/// `$XDG_CONFIG_HOME/git-convo` or `~/.config/git-convo`.
pub(crate) fn config_dir() -> PathBuf {
    xdg_or_home("XDG_CONFIG_HOME", &[".config"])
}

/// Base directory for persistent data.
///
/// `$XDG_DATA_HOME/git-convo` or `~/.local/share/git-convo`.
pub(crate) fn data_dir() -> PathBuf {
    xdg_or_home("XDG_DATA_HOME", &[".local", "share"])
}

/// Default directory for rolling log files.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}
