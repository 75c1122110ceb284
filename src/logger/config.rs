/// Logger configuration, populated from command-line flags at startup
use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Messages above this level are dropped (Error always passes)
    pub min_level: LogLevel,
    /// Tags with debug output enabled (`--debug-<tag>`)
    pub debug_tags: HashSet<String>,
    /// Tags with verbose output enabled (`--verbose-<tag>`)
    pub verbose_tags: HashSet<String>,
    /// Optional plain-text mirror of console output
    pub log_file: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            log_file: None,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

/// Build the logger configuration from the process arguments
pub fn init_from_args() {
    let mut config = LoggerConfig::default();

    if arguments::is_quiet_enabled() {
        config.min_level = LogLevel::Warning;
    }
    if arguments::is_verbose_enabled() {
        config.min_level = LogLevel::Verbose;
    }
    if let Some(level) = arguments::get_arg_value("--log-level").and_then(|v| LogLevel::parse(&v)) {
        config.min_level = level;
    }

    for tag in LogTag::all() {
        let key = tag.to_debug_key();
        if arguments::has_arg(&format!("--debug-{}", key)) {
            // Debug for one tag implies the threshold must let debug through
            if config.min_level < LogLevel::Debug {
                config.min_level = LogLevel::Debug;
            }
            config.debug_tags.insert(key.clone());
        }
        if arguments::has_arg(&format!("--verbose-{}", key)) {
            config.verbose_tags.insert(key);
        }
    }

    config.log_file = arguments::get_arg_value("--log-file").map(PathBuf::from);

    set_logger_config(config);
}

pub fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG.read().debug_tags.contains(&tag.to_debug_key())
}

pub fn is_verbose_enabled_for_tag(tag: &LogTag) -> bool {
    LOGGER_CONFIG
        .read()
        .verbose_tags
        .contains(&tag.to_debug_key())
}
