//! Logging configuration for recordkeeper.
//!
//! Events go to two places: an append-only log file, one line per event in
//! the form `2024-05-01T09:30:00 [INFO] message key=value`, and stderr,
//! filtered by the CLI verbosity flags.
//!
//! The subscriber is installed as the thread's default for as long as the
//! returned [`LogSink`] lives. Dropping the sink closes the log file.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Target for events that should be written with the `FATAL` label.
pub const FATAL_TARGET: &str = "recordkeeper::fatal";

/// Timestamp layout of log lines (ISO-8601, local time, second precision).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Emit an error event labelled `FATAL` in the log file.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => {
        ::tracing::error!(target: $crate::logging::FATAL_TARGET, $($arg)+)
    };
}

/// Verbosity level for console (stderr) output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Suppress all output except errors.
    Quiet,
    /// Warnings and errors.
    #[default]
    Normal,
    /// Verbose output (debug and above).
    Verbose,
    /// Very verbose output (trace level).
    Trace,
}

impl Verbosity {
    /// Convert verbosity to a tracing level.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Formats events as `<timestamp> [<LEVEL>] <message> <fields>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(
            writer,
            "{} [{}] ",
            Local::now().format(TIMESTAMP_FORMAT),
            level_label(metadata.target(), *metadata.level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_label(target: &str, level: Level) -> String {
    if target == FATAL_TARGET {
        "FATAL".to_string()
    } else {
        level.to_string()
    }
}

/// Scoped handle on the installed log subscriber.
///
/// Holds the log file open. Dropping it restores the previous subscriber and
/// releases the file.
pub struct LogSink {
    path: PathBuf,
    _guard: DefaultGuard,
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink").field("path", &self.path).finish()
    }
}

impl LogSink {
    /// Path of the log file this sink appends to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Initialize the logging system.
///
/// Creates the log file and its parent directories if needed, then installs
/// a subscriber for the current thread. Console output is controlled by
/// `verbosity`, or by `RUST_LOG` when set.
///
/// # Errors
///
/// Returns an error if the configured level is invalid or the log file
/// cannot be created or opened for appending.
pub fn init_logging(config: &LoggingConfig, verbosity: Verbosity) -> Result<LogSink> {
    let file_level = config.file_level()?;
    let path = config.log_path.clone();
    let file = open_log_file(&path)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LineFormat)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(LevelFilter::from_level(file_level));

    let default_filter = format!("recordkeeper={}", verbosity.to_level_filter());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(env_filter);

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer);

    let guard = tracing::subscriber::set_default(subscriber);
    Ok(LogSink {
        path,
        _guard: guard,
    })
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Error::LogInit {
            path: path.to_path_buf(),
            source,
        })
}

/// Append a bare `FATAL` line straight to `path`, ignoring any failure.
///
/// Used when the log sink itself could not be set up.
pub fn write_fallback_line(path: &Path, message: &str) {
    let line = format!("{} [FATAL] {message}", Local::now().format(TIMESTAMP_FORMAT));
    let _ = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| writeln!(file, "{line}"));
}
