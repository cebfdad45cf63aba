//! Config loading.
//!
//! Layers, lowest precedence first: built-in defaults, the user file, the
//! repository's `.git-convo.toml`, then `GIT_CONVO_*` environment overrides.

mod load;
mod merge;
mod schema;

pub use load::{
    ConfigError, config_path, load_for_repo, load_or_default, load_repo_config, load_user_config,
    repo_config_path,
};
pub use merge::{apply_env_overrides, apply_overrides_from, merge_layers};
pub use schema::{
    Config, ConfigLayer, FileLoggingConfig, FileLoggingConfigOverride, LogFormat, LoggingConfig,
    LoggingConfigOverride, RemapConfig, RemapConfigOverride, SyncConfig, SyncConfigOverride,
};
