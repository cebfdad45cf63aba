use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::merge::{apply_env_overrides, merge_layers};
use super::{Config, ConfigLayer};
use crate::error::{Effect, Transience};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn transience(&self) -> Transience {
        match self {
            ConfigError::Read { .. } => Transience::Unknown,
            ConfigError::Parse { .. } => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

pub fn config_path() -> PathBuf {
    crate::paths::config_dir().join("config.toml")
}

pub fn repo_config_path(repo_root: &Path) -> PathBuf {
    repo_root.join(".git-convo.toml")
}

fn read_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

pub fn load_user_config() -> Result<Option<ConfigLayer>, ConfigError> {
    read_layer(&config_path())
}

pub fn load_repo_config(repo_root: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    read_layer(&repo_config_path(repo_root))
}

pub fn load_for_repo(repo_root: Option<&Path>) -> Result<Config, ConfigError> {
    let user = load_user_config()?;
    let repo = match repo_root {
        Some(root) => load_repo_config(root)?,
        None => None,
    };
    let mut config = merge_layers(user, repo);
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Like [`load_for_repo`], but a broken file degrades to defaults with a
/// warning instead of failing the command.
pub fn load_or_default(repo_root: Option<&Path>) -> Config {
    match load_for_repo(repo_root) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("config load failed, using defaults: {e}");
            let mut cfg = Config::default();
            apply_env_overrides(&mut cfg);
            cfg
        }
    }
}
