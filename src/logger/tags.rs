/// Log tags identify the subsystem a message comes from.
///
/// Each tag maps to a `--debug-<key>` command-line flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Api,
    Prices,
    Cache,
    Webserver,
}

impl LogTag {
    /// Key used for `--debug-<key>` / `--verbose-<key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Api => "api",
            LogTag::Prices => "prices",
            LogTag::Cache => "cache",
            LogTag::Webserver => "webserver",
        }
        .to_string()
    }

    /// Uppercase label used in console and file output
    pub fn to_plain_string(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Api => "API",
            LogTag::Prices => "PRICES",
            LogTag::Cache => "CACHE",
            LogTag::Webserver => "WEBSERVER",
        }
    }

    pub fn all() -> &'static [LogTag] {
        &[
            LogTag::System,
            LogTag::Config,
            LogTag::Api,
            LogTag::Prices,
            LogTag::Cache,
            LogTag::Webserver,
        ]
    }
}
