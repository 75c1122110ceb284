/// Command-line argument helpers for the server binary
///
/// Arguments are captured once into a global so any module (the logger in
/// particular) can check flags without threading them through.
/// Binaries and tests can override them with [`set_cmd_args`].
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Default configuration file looked up when `--config` is absent
pub const DEFAULT_CONFIG_PATH: &str = "vendyz-prices.toml";

pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        // Poisoned mutex: fall back to the process arguments
        Err(_) => env::args().collect(),
    }
}

pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Value following a flag (`--flag value`), or `None` when absent
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .filter(|value| !value.starts_with("--"))
        .cloned()
}

pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

pub fn is_quiet_enabled() -> bool {
    has_arg("--quiet")
}

pub fn is_verbose_enabled() -> bool {
    has_arg("--verbose")
}

/// Configuration file path (`--config <path>`)
pub fn config_path() -> String {
    get_arg_value("--config").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Port override (`--port <port>`), ignored when not a valid u16
pub fn port_override() -> Option<u16> {
    get_arg_value("--port").and_then(|p| p.parse().ok())
}

pub fn print_help() {
    println!("vendyz-prices - token price proxy with a TTL cache");
    println!();
    println!("USAGE:");
    println!("    vendyz-prices [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --config <path>       Configuration file (default: {})", DEFAULT_CONFIG_PATH);
    println!("    --port <port>         Override the listen port");
    println!("    --log-file <path>     Mirror log output to a file");
    println!("    --log-level <level>   error | warning | info | debug | verbose");
    println!("    --quiet               Only show warnings and errors");
    println!("    --verbose             Also show verbose output (upstream request URLs)");
    println!("    --verbose-<module>    Verbose output for one module");
    println!("    --debug-<module>      Debug logs for one module:");
    println!("                          system, config, api, prices, cache, webserver");
    println!("    -h, --help            Print this help");
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test touches the global so parallel tests do not interleave
    #[test]
    fn test_argument_lookup() {
        let saved = get_cmd_args();

        set_cmd_args(
            ["vendyz-prices", "--config", "prod.toml", "--port", "9000", "--log-file", "--quiet"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        assert_eq!(config_path(), "prod.toml");
        assert_eq!(port_override(), Some(9000));
        assert!(is_quiet_enabled());
        assert!(!is_verbose_enabled());
        // Flag followed by another flag has no value
        assert_eq!(get_arg_value("--log-file"), None);

        set_cmd_args(vec!["vendyz-prices".to_string(), "--port".to_string(), "http".to_string()]);
        assert_eq!(config_path(), DEFAULT_CONFIG_PATH);
        assert_eq!(port_override(), None);

        set_cmd_args(saved);
    }
}
