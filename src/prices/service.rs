/// Price lookup orchestration over an ordered provider chain
///
/// Single lookups walk the chain one provider at a time. Batch lookups send
/// one request per batch-capable provider and fan out concurrently to
/// single-address providers for whatever is still missing. Upstream errors
/// are logged and absorbed; callers only ever see the zero-price sentinel.
use super::cache::PriceCache;
use super::provider::PriceProvider;
use super::types::{normalize_address, usable_price, PriceLookup, PriceQuote, PriceSource};
use crate::apis::{ApiError, ApiStats, CoinGeckoClient, MoralisClient};
use crate::config::Config;
use crate::logger::{self, LogTag};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Error attached to a single lookup nobody could price
pub const ALL_SOURCES_FAILED: &str = "All sources failed";

/// In-flight requests per single-address provider during a batch lookup
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

pub struct PriceService {
    cache: PriceCache,
    providers: Vec<Arc<dyn PriceProvider>>,
    provider_timeout: Duration,
    max_concurrency: usize,
}

impl PriceService {
    pub fn new(
        cache: PriceCache,
        providers: Vec<Arc<dyn PriceProvider>>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            providers,
            provider_timeout,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Bound the fan-out to single-address providers (at least 1)
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Build the CoinGecko → Moralis chain described by `config`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut providers: Vec<Arc<dyn PriceProvider>> = Vec::new();

        let coingecko = &config.providers.coingecko;
        if coingecko.enabled {
            if coingecko.api_key.is_empty() {
                logger::warning(LogTag::Config, "CoinGecko API key not set, using keyless access");
            }
            providers.push(Arc::new(
                CoinGeckoClient::from_config(coingecko)?
                    .with_request_timeout(config.providers.timeout()),
            ));
        }

        let moralis = &config.providers.moralis;
        if moralis.enabled {
            if moralis.api_key.is_empty() {
                logger::warning(LogTag::Config, "Moralis API key not set, requests will likely be rejected");
            }
            providers.push(Arc::new(
                MoralisClient::from_config(moralis)?
                    .with_request_timeout(config.providers.timeout()),
            ));
        }

        if providers.is_empty() {
            anyhow::bail!("no price providers enabled");
        }

        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        logger::info(
            LogTag::Prices,
            &format!(
                "Price chain: {} (ttl={}s, timeout={}s, concurrency={})",
                names.join(" -> "),
                config.cache.ttl_secs,
                config.providers.timeout_secs,
                config.providers.max_concurrency
            ),
        );

        Ok(Self::new(
            PriceCache::new(config.cache.ttl()),
            providers,
            config.providers.timeout(),
        )
        .with_max_concurrency(config.providers.max_concurrency))
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    pub fn providers(&self) -> &[Arc<dyn PriceProvider>] {
        &self.providers
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Request statistics per provider, in chain order
    pub fn provider_stats(&self) -> Vec<(&'static str, ApiStats)> {
        self.providers.iter().map(|p| (p.name(), p.stats())).collect()
    }

    /// Price for one token address
    pub async fn get_price(&self, address: &str) -> PriceLookup {
        let key = normalize_address(address);

        if let Some(entry) = self.cache.get(&key) {
            logger::debug(
                LogTag::Cache,
                &format!("Cache hit {} -> ${} ({})", key, entry.price, entry.provider),
            );
            return PriceLookup {
                price: entry.price,
                source: entry.source,
                cached: true,
                error: None,
            };
        }

        for (index, provider) in self.providers.iter().enumerate() {
            if let Some(price) = self.fetch_single(provider.as_ref(), &key).await {
                let source = PriceSource::for_chain_index(index);
                self.cache.insert(&key, price, source, provider.name());
                logger::debug(
                    LogTag::Prices,
                    &format!("{} priced at ${} by {} ({})", key, price, provider.name(), source),
                );
                return PriceLookup {
                    price,
                    source,
                    cached: false,
                    error: None,
                };
            }
        }

        logger::warning(LogTag::Prices, &format!("No price for {}: all sources failed", key));
        PriceLookup {
            price: 0.0,
            source: PriceSource::None,
            cached: false,
            error: Some(ALL_SOURCES_FAILED.to_string()),
        }
    }

    /// Prices for several token addresses
    ///
    /// Every requested address (normalized) appears exactly once in the
    /// result; unresolved ones carry the zero-price sentinel.
    pub async fn get_prices(&self, addresses: &[String]) -> HashMap<String, PriceQuote> {
        let (mut results, mut missing) = self.cache.partition(addresses);

        if !results.is_empty() {
            logger::debug(
                LogTag::Cache,
                &format!("Batch: {} cached, {} to fetch", results.len(), missing.len()),
            );
        }

        for (index, provider) in self.providers.iter().enumerate() {
            if missing.is_empty() {
                break;
            }

            let source = PriceSource::for_chain_index(index);
            let found = if provider.supports_batch() {
                self.fetch_batch(provider.as_ref(), &missing).await
            } else {
                self.fetch_each(provider.as_ref(), &missing).await
            };

            logger::debug(
                LogTag::Prices,
                &format!(
                    "{} resolved {}/{} addresses",
                    provider.name(),
                    found.len(),
                    missing.len()
                ),
            );

            for (address, price) in found {
                self.cache.insert(&address, price, source, provider.name());
                results.insert(address, PriceQuote { price, source });
            }
            missing.retain(|address| !results.contains_key(address));
        }

        if !missing.is_empty() {
            logger::warning(
                LogTag::Prices,
                &format!("No price for {} address(es): {}", missing.len(), missing.join(",")),
            );
        }
        for address in missing {
            results.insert(address, PriceQuote::unavailable());
        }

        results
    }

    /// Run one provider call under the service timeout
    ///
    /// Providers that time their own requests are left alone so a wait on
    /// their rate limiter does not count against the call.
    async fn bounded<T, F>(&self, provider: &dyn PriceProvider, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if provider.request_timeout().is_some() {
            return call.await;
        }
        match tokio::time::timeout(self.provider_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(self.provider_timeout)),
        }
    }

    /// One provider, one address; any failure is `None`
    async fn fetch_single(&self, provider: &dyn PriceProvider, address: &str) -> Option<f64> {
        match self.bounded(provider, provider.fetch_price(address)).await {
            Ok(Some(price)) => {
                let usable = usable_price(price);
                if usable.is_none() {
                    logger::debug(
                        LogTag::Prices,
                        &format!("{} returned unusable price {} for {}", provider.name(), price, address),
                    );
                }
                usable
            }
            Ok(None) => {
                logger::debug(
                    LogTag::Prices,
                    &format!("{} has no price for {}", provider.name(), address),
                );
                None
            }
            Err(e) => {
                logger::warning(
                    LogTag::Api,
                    &format!("{} failed for {}: {}", provider.name(), address, e),
                );
                None
            }
        }
    }

    /// Batch-capable provider: one request per chunk, usable prices only
    async fn fetch_batch(&self, provider: &dyn PriceProvider, addresses: &[String]) -> HashMap<String, f64> {
        let chunk_size = provider.max_batch_size().unwrap_or(addresses.len()).max(1);
        let requested: HashSet<&str> = addresses.iter().map(String::as_str).collect();
        let mut found = HashMap::new();

        for chunk in addresses.chunks(chunk_size) {
            let prices = match self.bounded(provider, provider.fetch_prices(chunk)).await {
                Ok(prices) => prices,
                Err(e) => {
                    logger::warning(
                        LogTag::Api,
                        &format!("{} batch of {} failed: {}", provider.name(), chunk.len(), e),
                    );
                    continue;
                }
            };

            for (address, price) in prices {
                let address = normalize_address(&address);
                // Ignore anything the upstream returned that was not asked for
                if !requested.contains(address.as_str()) {
                    continue;
                }
                if let Some(price) = usable_price(price) {
                    found.insert(address, price);
                }
            }
        }

        found
    }

    /// Single-address provider: at most `max_concurrency` requests in flight
    async fn fetch_each(&self, provider: &dyn PriceProvider, addresses: &[String]) -> HashMap<String, f64> {
        let lookups: Vec<(String, Option<f64>)> = stream::iter(addresses.iter().cloned())
            .map(move |address: String| async move {
                let price = self.fetch_single(provider, &address).await;
                (address, price)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        lookups
            .into_iter()
            .filter_map(|(address, price)| price.map(|p| (address, p)))
            .collect()
    }
}
