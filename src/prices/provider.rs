/// Upstream price source abstraction
///
/// The price service holds an ordered list of providers and tries them in
/// sequence. A provider is either batch-capable (one request covers many
/// addresses) or single-address.
use crate::apis::{ApiError, ApiStats};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Short provider name used in logs, stats and cache entries
    fn name(&self) -> &'static str;

    /// Whether [`fetch_prices`](Self::fetch_prices) accepts several addresses per call
    fn supports_batch(&self) -> bool {
        false
    }

    /// Upper bound on addresses per batch request (`None` = unbounded)
    fn max_batch_size(&self) -> Option<usize> {
        None
    }

    /// Per-request timeout the provider enforces itself, after any rate-limit wait
    ///
    /// When `None`, the price service bounds each call with its own timeout.
    fn request_timeout(&self) -> Option<Duration> {
        None
    }

    /// Price for one lowercase address; `Ok(None)` when the source has no price
    async fn fetch_price(&self, address: &str) -> Result<Option<f64>, ApiError>;

    /// Prices for several lowercase addresses
    ///
    /// Addresses the source does not know are simply absent from the map.
    /// The default issues one request per address, sequentially; batch
    /// providers override it with a single request.
    async fn fetch_prices(&self, addresses: &[String]) -> Result<HashMap<String, f64>, ApiError> {
        let mut prices = HashMap::new();
        for address in addresses {
            if let Some(price) = self.fetch_price(address).await? {
                prices.insert(address.clone(), price);
            }
        }
        Ok(prices)
    }

    /// Request statistics for this provider
    fn stats(&self) -> ApiStats {
        ApiStats::default()
    }
}
