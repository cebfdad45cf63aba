use super::{Config, ConfigLayer};

pub fn merge_layers(user: Option<ConfigLayer>, repo: Option<ConfigLayer>) -> Config {
    let mut config = Config::default();
    if let Some(layer) = user {
        layer.apply_to(&mut config);
    }
    if let Some(layer) = repo {
        layer.apply_to(&mut config);
    }
    config
}

pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply `GIT_CONVO_*` overrides read through `lookup`.
pub fn apply_overrides_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| {
        lookup(key)
            .map(|raw| raw.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    if let Some(raw) = get("GIT_CONVO_DEBUG") {
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => config.debug = true,
            "0" | "false" | "no" | "off" => config.debug = false,
            _ => tracing::warn!("invalid GIT_CONVO_DEBUG, ignoring: {raw}"),
        }
    }

    if let Some(remote) = get("GIT_CONVO_REMOTE") {
        config.sync.remote = remote;
    }

    if let Some(raw) = get("GIT_CONVO_SYNC_TIMEOUT_MS") {
        match raw.parse::<u64>() {
            Ok(value) => config.sync.timeout_ms = value,
            Err(err) => tracing::warn!("invalid GIT_CONVO_SYNC_TIMEOUT_MS, ignoring: {err}"),
        }
    }

    if let Some(dir) = get("GIT_CONVO_LOG_DIR") {
        config.logging.file.enabled = true;
        config.logging.file.dir = Some(dir.into());
    }
}
