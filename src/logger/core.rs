/// Filtering rules applied before a message is formatted
use super::config::{get_logger_config, is_debug_enabled_for_tag, is_verbose_enabled_for_tag};
use super::levels::LogLevel;
use super::tags::LogTag;

/// Check if a log message should be displayed
///
/// 1. Errors are always shown
/// 2. Anything above the minimum level is dropped
/// 3. Debug requires `--debug-<tag>`
/// 4. Verbose requires `--verbose` or `--verbose-<tag>`
pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    let config = get_logger_config();

    if level == LogLevel::Verbose {
        return config.min_level == LogLevel::Verbose || is_verbose_enabled_for_tag(tag);
    }

    if level > config.min_level {
        return false;
    }

    if level == LogLevel::Debug {
        return is_debug_enabled_for_tag(tag);
    }

    true
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    super::format::format_and_log(tag, level, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::config::{set_logger_config, LoggerConfig};

    // Single test so the global config is not raced by parallel tests
    #[test]
    fn test_should_log_rules() {
        set_logger_config(LoggerConfig::default());
        assert!(should_log(&LogTag::Prices, LogLevel::Error));
        assert!(should_log(&LogTag::Prices, LogLevel::Info));
        assert!(!should_log(&LogTag::Prices, LogLevel::Debug));
        assert!(!should_log(&LogTag::Prices, LogLevel::Verbose));

        let mut config = LoggerConfig::default();
        config.min_level = LogLevel::Debug;
        config.debug_tags.insert("api".to_string());
        set_logger_config(config);
        assert!(should_log(&LogTag::Api, LogLevel::Debug));
        assert!(!should_log(&LogTag::Cache, LogLevel::Debug));

        let mut config = LoggerConfig::default();
        config.min_level = LogLevel::Warning;
        set_logger_config(config);
        assert!(!should_log(&LogTag::System, LogLevel::Info));
        assert!(should_log(&LogTag::System, LogLevel::Warning));

        // --verbose
        let mut config = LoggerConfig::default();
        config.min_level = LogLevel::Verbose;
        set_logger_config(config);
        assert!(should_log(&LogTag::Api, LogLevel::Verbose));
        assert!(should_log(&LogTag::Cache, LogLevel::Info));

        // --verbose-api
        let mut config = LoggerConfig::default();
        config.verbose_tags.insert("api".to_string());
        set_logger_config(config);
        assert!(should_log(&LogTag::Api, LogLevel::Verbose));
        assert!(!should_log(&LogTag::Cache, LogLevel::Verbose));

        set_logger_config(LoggerConfig::default());
    }
}
