//! Tracing setup for one command run.
//!
//! Events go to stderr as an indented span tree (or JSON lines) and, when
//! enabled, to a daily JSON log file. Opening the file appender deletes all
//! but the newest `keep_days` files carrying our prefix.

use tracing::metadata::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{FileLoggingConfig, LogFormat, LoggingConfig};
use crate::paths;

const LOG_FILE_PREFIX: &str = "git-convo";
const LOG_FILE_SUFFIX: &str = "jsonl";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Everything `init` needs, resolved from flags and config by the caller.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// `-v` count from the command line.
    pub verbosity: u8,
    /// `Config::debug`; forces debug level regardless of verbosity.
    pub debug: bool,
    pub logging: LoggingConfig,
}

impl TelemetryConfig {
    pub fn new(verbosity: u8, debug: bool, logging: LoggingConfig) -> Self {
        Self {
            verbosity,
            debug,
            logging,
        }
    }
}

/// Dropping this flushes the log file.
pub struct TelemetryGuard {
    _file: Option<WorkerGuard>,
}

pub fn init(config: TelemetryConfig) -> TelemetryGuard {
    let logging = &config.logging;
    let mut layers: Vec<BoxedLayer> = Vec::new();
    if logging.stderr {
        layers.push(stderr_layer(logging.stderr_format));
    }

    let mut file = None;
    let mut file_error = None;
    if logging.file.enabled {
        match file_layer(&logging.file) {
            Ok((layer, guard)) => {
                layers.push(layer);
                file = Some(guard);
            }
            Err(e) => file_error = Some(e),
        }
    }

    let level = default_level(config.verbosity, config.debug);
    layers.push(Box::new(env_filter(logging.filter.as_deref(), level)));
    Registry::default().with(layers).init();

    if let Some(e) = file_error {
        tracing::warn!(error = %e, "file logging disabled");
    }
    TelemetryGuard { _file: file }
}

/// Explicit directives win over the `LOG` environment variable.
fn env_filter(directives: Option<&str>, level: LevelFilter) -> EnvFilter {
    let builder = EnvFilter::builder().with_default_directive(level.into());
    match directives {
        Some(directives) => builder.parse_lossy(directives),
        None => builder.with_env_var("LOG").from_env_lossy(),
    }
}

fn stderr_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Tree => Box::new(
            tracing_tree::HierarchicalLayer::new(2)
                .with_writer(std::io::stderr)
                .with_targets(true)
                .with_bracketed_fields(true),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true),
        ),
    }
}

fn file_layer(config: &FileLoggingConfig) -> Result<(BoxedLayer, WorkerGuard), InitError> {
    let dir = config.dir.clone().unwrap_or_else(paths::log_dir);
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(config.keep_days.max(1))
        .build(&dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(writer)
        .with_current_span(true);
    Ok((Box::new(layer), guard))
}

fn default_level(verbosity: u8, debug: bool) -> LevelFilter {
    if debug {
        return LevelFilter::DEBUG;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
