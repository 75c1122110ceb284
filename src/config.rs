use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `providers.coingecko.api_key`
pub const ENV_COINGECKO_API_KEY: &str = "COINGECKO_API_KEY";
/// Environment variable overriding `providers.moralis.api_key`
pub const ENV_MORALIS_API_KEY: &str = "MORALIS_API_KEY";
/// Environment variable overriding `server.port`
pub const ENV_PORT: &str = "VENDYZ_PRICES_PORT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest `tokens` array accepted by `POST /api/prices`
    pub max_batch_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum age of a cached price before it must be refetched
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Upper bound on a single provider call, enforced by the price service
    pub timeout_secs: u64,
    /// In-flight requests per single-address provider during a batch lookup
    pub max_concurrency: usize,
    pub coingecko: CoinGeckoConfig,
    pub moralis: MoralisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinGeckoConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
    /// Asset platform id used in `simple/token_price/{platform}`
    pub platform: String,
    pub timeout_secs: u64,
    /// 0 disables rate limiting
    pub rate_limit_per_minute: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MoralisConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
    pub chain: String,
    pub timeout_secs: u64,
    /// 0 disables rate limiting
    pub rate_limit_per_minute: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_batch_tokens: 250,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300, // 5 minutes
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_concurrency: 8,
            coingecko: CoinGeckoConfig::default(),
            moralis: MoralisConfig::default(),
        }
    }
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            api_key: String::new(),
            platform: "base".to_string(),
            timeout_secs: 10,
            rate_limit_per_minute: 30, // demo tier
        }
    }
}

impl Default for MoralisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://deep-index.moralis.io/api/v2.2".to_string(),
            api_key: String::new(),
            chain: "base".to_string(),
            timeout_secs: 10,
            rate_limit_per_minute: 0,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl ProvidersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields defaults. Environment overrides are applied
    /// afterwards and the result is validated.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write config file: {}", path))?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_COINGECKO_API_KEY).filter(|v| !v.is_empty()) {
            self.providers.coingecko.api_key = key;
        }
        if let Some(key) = lookup(ENV_MORALIS_API_KEY).filter(|v| !v.is_empty()) {
            self.providers.moralis.api_key = key;
        }
        if let Some(port) = lookup(ENV_PORT).and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            bail!("cache.ttl_secs must be greater than zero");
        }
        if self.providers.timeout_secs == 0 {
            bail!("providers.timeout_secs must be greater than zero");
        }
        if self.providers.max_concurrency == 0 {
            bail!("providers.max_concurrency must be greater than zero");
        }
        if self.server.max_batch_tokens == 0 {
            bail!("server.max_batch_tokens must be greater than zero");
        }
        if !self.providers.coingecko.enabled && !self.providers.moralis.enabled {
            bail!("at least one price provider must be enabled");
        }
        if self.providers.coingecko.enabled && self.providers.coingecko.timeout_secs == 0 {
            bail!("providers.coingecko.timeout_secs must be greater than zero");
        }
        if self.providers.moralis.enabled && self.providers.moralis.timeout_secs == 0 {
            bail!("providers.moralis.timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.providers.coingecko.platform, "base");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [server]
            port = 9090

            [providers.moralis]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.providers.moralis.enabled);
        assert!(config.providers.coingecko.enabled);
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.server.max_batch_tokens, 250);
        assert_eq!(config.providers.max_concurrency, 8);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            ENV_COINGECKO_API_KEY => Some("cg-key".to_string()),
            ENV_MORALIS_API_KEY => Some(String::new()),
            ENV_PORT => Some("7000".to_string()),
            _ => None,
        });

        assert_eq!(config.providers.coingecko.api_key, "cg-key");
        // Empty values do not clobber configured keys
        assert_eq!(config.providers.moralis.api_key, "");
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.cache.ttl_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.providers.coingecko.enabled = false;
        config.providers.moralis.enabled = false;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.providers.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.providers.max_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.max_batch_tokens = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.toml");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.cache.ttl_secs = 60;
        config.providers.coingecko.platform = "ethereum".to_string();
        config.save(path).unwrap();

        let loaded = Config::load(path).unwrap();
        assert_eq!(loaded.cache.ttl_secs, 60);
        assert_eq!(loaded.providers.coingecko.platform, "ethereum");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.cache.ttl_secs, Config::default().cache.ttl_secs);
        assert!(!path.exists());
    }
}
