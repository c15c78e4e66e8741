//! Logging setup.
//!
//! The library only emits `tracing` events. Binaries call [`init_logging`]
//! once at startup to route them to stderr and, optionally, to a
//! `downloader.log` file in the destination directory.
//!
//! `RUST_LOG` overrides the configured level when set.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use time::format_description::well_known::Rfc3339;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Name of the per-run log file.
pub const LOG_FILENAME: &str = "downloader.log";

/// Errors from logging setup.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to open log file {}: {source}", path.display())]
    OpenFailed { path: PathBuf, source: io::Error },

    #[error("invalid log level '{0}'")]
    InvalidLevel(String),

    #[error("failed to install subscriber: {0}")]
    Init(String),
}

/// Logging options resolved by the caller.
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub level: LevelFilter,
    /// Directory for [`LOG_FILENAME`]; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            log_dir: None,
        }
    }
}

impl LoggingOptions {
    /// Parse a level name (`debug`, `info`, `warn`/`warning`, `error`; case-insensitive).
    pub fn with_level_str(mut self, level: &str) -> Result<Self, LoggingError> {
        let name = match level.trim() {
            l if l.eq_ignore_ascii_case("warning") => "warn",
            l => l,
        };
        self.level = LevelFilter::from_str(name)
            .map_err(|_| LoggingError::InvalidLevel(level.to_string()))?;
        Ok(self)
    }

    pub fn with_log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.log_dir = dir;
        self
    }

    fn default_directives(&self) -> String {
        format!("aparatdl={level},aparatdl_cli={level}", level = self.level)
    }
}

/// Keeps the file writer alive; dropping it flushes pending log lines.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingGuard {
    /// Path of the log file, if file logging is enabled.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

impl fmt::Debug for LoggingGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingGuard")
            .field("log_file", &self.log_file)
            .finish()
    }
}

/// Install the global subscriber.
///
/// Call before starting any worker threads: the local UTC offset is captured
/// once here.
pub fn init_logging(options: &LoggingOptions) -> Result<LoggingGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_directives()));

    let timer =
        OffsetTime::local_rfc_3339().unwrap_or_else(|_| OffsetTime::new(UtcOffset::UTC, Rfc3339));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_timer(timer.clone())
        .with_target(false);

    let (file_layer, file_guard, log_file) = match options.log_dir {
        Some(ref dir) => {
            let path = dir.join(LOG_FILENAME);
            let file = open_log_file(&path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_timer(timer)
                .with_ansi(false);
            (Some(layer), Some(guard), Some(path))
        }
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_file,
    })
}

fn open_log_file(path: &Path) -> Result<fs::File, LoggingError> {
    let open_failed = |source| LoggingError::OpenFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(open_failed)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_failed)
}
