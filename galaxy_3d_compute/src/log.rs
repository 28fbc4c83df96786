//! Logging for the Galaxy3D compute layer
//!
//! Every log line goes through `Engine`, which forwards it to the installed
//! `Logger` (a colored console logger by default). Entries carry the name
//! of the emitting thread, so lines written by executor workers
//! (`galaxy3d-compute-N`) can be told apart from the caller's.
//!
//! Macros: `engine_trace!` .. `engine_error!` log at one severity;
//! `engine_err!` / `engine_bail!` log an ERROR and produce the matching
//! `Error::BackendError`.

use std::fmt;
use std::time::SystemTime;
use chrono::{DateTime, Local};
use colored::*;

/// Destination of compute-layer log entries
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_compute::galaxy3d::log::{Logger, LogEntry, LogSeverity};
///
/// /// Keeps warnings and errors for a host application's console
/// struct ConsoleSink;
///
/// impl Logger for ConsoleSink {
///     fn log(&self, entry: &LogEntry) {
///         if entry.severity >= LogSeverity::Warn {
///             // forward entry.message...
///         }
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,

    pub timestamp: SystemTime,

    /// Namespaced origin, e.g. "galaxy3d::compute::Executor"
    pub source: String,

    pub message: String,

    /// Name of the thread that emitted the entry, if it has one
    pub thread: Option<String>,

    /// Source file (ERROR entries built by `engine_error!`/`engine_err!`)
    pub file: Option<&'static str>,

    /// Source line (ERROR entries built by `engine_error!`/`engine_err!`)
    pub line: Option<u32>,
}

/// Log severity levels, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-buffer and per-command execution details
    Trace,
    /// Backend probing, pool and worker setup
    Debug,
    /// Context lifecycle
    Info,
    /// Backend fallbacks, skipped dispatches, unsynchronized commands
    Warn,
    /// Failed initialization and panicking kernels
    Error,
}

impl LogSeverity {
    /// Fixed-width upper-case label
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn colorize(self) -> ColoredString {
        let label = self.label();
        match self {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().trim_end())
    }
}

/// Console logger
///
/// `[timestamp] [SEVERITY] [source] {thread} message (file:line)`, where the
/// thread and location parts only appear when the entry has them. WARN and
/// ERROR go to stderr, everything else to stdout.
pub struct DefaultLogger;

impl DefaultLogger {
    /// Render `entry` the way it is printed
    pub fn format(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let mut line = format!(
            "[{}] [{}] [{}]",
            datetime.format("%Y-%m-%d %H:%M:%S%.3f"),
            entry.severity.colorize(),
            entry.source.bright_blue(),
        );
        if let Some(thread) = &entry.thread {
            line.push_str(&format!(" {{{}}}", thread));
        }
        line.push(' ');
        line.push_str(&entry.message);
        if let (Some(file), Some(number)) = (entry.file, entry.line) {
            line.push_str(&format!(" ({}:{})", file, number));
        }
        line
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let line = Self::format(entry);
        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

#[doc(hidden)]
#[macro_export]
macro_rules! __galaxy3d_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log(
            $crate::galaxy3d::log::LogSeverity::$severity,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a TRACE message
///
/// ```ignore
/// engine_trace!("galaxy3d::compute::Executor", "Range {}..{} done", start, end);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => { $crate::__galaxy3d_log!(Trace, $source, $($arg)*) };
}

#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => { $crate::__galaxy3d_log!(Debug, $source, $($arg)*) };
}

/// Log an INFO message
///
/// ```ignore
/// engine_info!("galaxy3d::compute::Context", "Using backend {}", backend);
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => { $crate::__galaxy3d_log!(Info, $source, $($arg)*) };
}

#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => { $crate::__galaxy3d_log!(Warn, $source, $($arg)*) };
}

/// Log an ERROR message with the caller's file:line
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log_detailed(
            $crate::galaxy3d::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR message and build the matching `Error::BackendError`
///
/// ```ignore
/// let probe = load_driver()
///     .map_err(|e| engine_err!("galaxy3d::vulkan", "Driver unavailable: {}", e))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return early with `Error::BackendError`
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
