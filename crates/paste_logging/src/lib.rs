#![deny(missing_docs)]
//! Logging for just_paste.
//!
//! Crates log through the `paste_*` macros. The binary installs the real
//! loggers once with [`initialize`]; test binaries call
//! [`initialize_for_tests`] instead.

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    TestLogger, WriteLogger,
};

#[doc(hidden)]
pub use log as __log;

/// Log file used by the terminal client, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "./just_paste.log";

/// Trace-level log line.
#[macro_export]
macro_rules! paste_trace {
    ($($arg:tt)*) => { $crate::__log::trace!($($arg)*) };
}

/// Debug-level log line.
#[macro_export]
macro_rules! paste_debug {
    ($($arg:tt)*) => { $crate::__log::debug!($($arg)*) };
}

/// Info-level log line.
#[macro_export]
macro_rules! paste_info {
    ($($arg:tt)*) => { $crate::__log::info!($($arg)*) };
}

/// Warn-level log line.
#[macro_export]
macro_rules! paste_warn {
    ($($arg:tt)*) => { $crate::__log::warn!($($arg)*) };
}

/// Error-level log line.
#[macro_export]
macro_rules! paste_error {
    ($($arg:tt)*) => { $crate::__log::error!($($arg)*) };
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogDestination {
    /// Only the log file; stdout stays free for the interactive screen.
    #[default]
    File,
    /// Only stderr.
    Terminal,
    /// The log file and stderr.
    Both,
}

impl LogDestination {
    fn to_file(self) -> bool {
        matches!(self, LogDestination::File | LogDestination::Both)
    }

    fn to_terminal(self) -> bool {
        matches!(self, LogDestination::Terminal | LogDestination::Both)
    }
}

/// Installs the global logger.
///
/// A log file that cannot be created is reported on stderr and skipped. A
/// second call leaves the first logger in place.
pub fn initialize(destination: LogDestination, level: LevelFilter, log_file: &Path) {
    let loggers = build_loggers(destination, level, log_file);
    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }
}

/// The loggers [`initialize`] would install for `destination`.
pub fn build_loggers(
    destination: LogDestination,
    level: LevelFilter,
    log_file: &Path,
) -> Vec<Box<dyn SharedLogger>> {
    let config = client_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if destination.to_terminal() {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    if destination.to_file() {
        match File::create(log_file) {
            Ok(file) => loggers.push(WriteLogger::new(level, config, file)),
            Err(err) => {
                eprintln!("just_paste: cannot write log file {}: {err}", log_file.display())
            }
        }
    }
    loggers
}

/// Routes log lines into the test harness output. Safe to call from every test.
pub fn initialize_for_tests() {
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());
}

fn client_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}
