use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raises the log level to debug everywhere.
    pub debug: bool,
    pub logging: LoggingConfig,
    pub sync: SyncConfig,
    pub remap: RemapConfig,
}

/// Stderr log shape: an indented span tree for people, or JSON lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Tree,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stderr: bool,
    pub stderr_format: LogFormat,
    pub filter: Option<String>,
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stderr: true,
            stderr_format: LogFormat::Tree,
            filter: None,
            file: FileLoggingConfig::default(),
        }
    }
}

/// Daily JSON log files, one per day that ran a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
    /// Newest daily files kept; older ones are deleted at startup.
    pub keep_days: usize,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            keep_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub remote: String,
    /// Deadline for a single fetch or push.
    pub timeout_ms: u64,
    /// Pull-and-retry rounds after a diverged push.
    pub max_retries: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            timeout_ms: 60_000,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemapConfig {
    pub max_candidates: usize,
    pub prune: bool,
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            max_candidates: 5_000,
            prune: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfigOverride {
    pub stderr: Option<bool>,
    pub stderr_format: Option<LogFormat>,
    pub filter: Option<String>,
    pub file: Option<FileLoggingConfigOverride>,
}

impl LoggingConfigOverride {
    pub fn apply_to(&self, target: &mut LoggingConfig) {
        if let Some(stderr) = self.stderr {
            target.stderr = stderr;
        }
        if let Some(format) = self.stderr_format {
            target.stderr_format = format;
        }
        if let Some(filter) = self.filter.as_ref() {
            target.filter = Some(filter.clone());
        }
        if let Some(file) = self.file.as_ref() {
            file.apply_to(&mut target.file);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoggingConfigOverride {
    pub enabled: Option<bool>,
    pub dir: Option<PathBuf>,
    pub keep_days: Option<usize>,
}

impl FileLoggingConfigOverride {
    pub fn apply_to(&self, target: &mut FileLoggingConfig) {
        if let Some(enabled) = self.enabled {
            target.enabled = enabled;
        }
        if let Some(dir) = self.dir.as_ref() {
            target.dir = Some(dir.clone());
        }
        if let Some(keep_days) = self.keep_days {
            target.keep_days = keep_days;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfigOverride {
    pub remote: Option<String>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<usize>,
}

impl SyncConfigOverride {
    pub fn apply_to(&self, target: &mut SyncConfig) {
        if let Some(remote) = self.remote.as_ref() {
            target.remote = remote.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            target.timeout_ms = timeout_ms;
        }
        if let Some(max_retries) = self.max_retries {
            target.max_retries = max_retries;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RemapConfigOverride {
    pub max_candidates: Option<usize>,
    pub prune: Option<bool>,
}

impl RemapConfigOverride {
    pub fn apply_to(&self, target: &mut RemapConfig) {
        if let Some(max_candidates) = self.max_candidates {
            target.max_candidates = max_candidates;
        }
        if let Some(prune) = self.prune {
            target.prune = prune;
        }
    }
}

/// One config file. Every field is optional so a layer only overrides what
/// it names.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigLayer {
    pub debug: Option<bool>,
    pub logging: LoggingConfigOverride,
    pub sync: SyncConfigOverride,
    pub remap: RemapConfigOverride,
}

impl ConfigLayer {
    pub fn apply_to(&self, base: &mut Config) {
        if let Some(debug) = self.debug {
            base.debug = debug;
        }
        self.logging.apply_to(&mut base.logging);
        self.sync.apply_to(&mut base.sync);
        self.remap.apply_to(&mut base.remap);
    }
}
