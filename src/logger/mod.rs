//! Structured logging for the price proxy
//!
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via `--debug-<module>` flags
//! - Colored console output, optionally mirrored to `--log-file <path>`
//!
//! ```rust,ignore
//! use vendyz_prices::logger::{self, LogTag};
//!
//! logger::warning(LogTag::Api, "CoinGecko returned HTTP 429");
//! logger::debug(LogTag::Cache, "cache hit 0xabc"); // Only with --debug-cache
//! ```
//!
//! Call [`init`] once at startup, before any logging occurs.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger from command-line arguments and open the log file
pub fn init() {
    config::init_from_args();
    file::init_file_logging();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level, only shown with `--debug-<tag>`
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level, only shown with `--verbose` or `--verbose-<tag>`
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Flush pending log file writes (call during shutdown)
pub fn flush() {
    file::flush_file_logging();
}
