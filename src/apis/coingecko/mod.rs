/// CoinGecko API client (primary price source)
///
/// API Documentation: https://docs.coingecko.com/reference/simple-token-price
///
/// Endpoint used:
/// - /simple/token_price/{platform}?contract_addresses=a,b,c&vs_currencies=usd
///
/// Batch-capable: many contract addresses per request.
pub mod types;

use self::types::CoinGeckoTokenPriceResponse;
use crate::apis::client::{HttpClient, RateLimiter};
use crate::apis::stats::{ApiStats, ApiStatsTracker};
use crate::apis::ApiError;
use crate::config::CoinGeckoConfig;
use crate::logger::{self, LogTag};
use crate::prices::PriceProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub const PROVIDER_NAME: &str = "coingecko";

/// Addresses per request; keeps the query string well under URL limits
pub const MAX_ADDRESSES_PER_REQUEST: usize = 100;

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

pub struct CoinGeckoClient {
    http_client: HttpClient,
    limiter: RateLimiter,
    stats: ApiStatsTracker,
    base_url: String,
    api_key: String,
    platform: String,
}

impl CoinGeckoClient {
    pub fn from_config(config: &CoinGeckoConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http_client: HttpClient::new(config.timeout_secs)?,
            limiter: RateLimiter::new(config.rate_limit_per_minute),
            stats: ApiStatsTracker::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            platform: config.platform.clone(),
        })
    }

    /// Lower the per-request timeout (rate-limit waits excluded)
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.http_client.cap_timeout(timeout);
        self
    }

    fn token_price_url(&self, addresses: &[String]) -> Result<Url, ApiError> {
        let joined = addresses
            .iter()
            .map(|a| a.to_lowercase())
            .collect::<Vec<_>>()
            .join(",");
        let endpoint = format!("{}/simple/token_price/{}", self.base_url, self.platform);

        Url::parse_with_params(
            &endpoint,
            &[("contract_addresses", joined.as_str()), ("vs_currencies", "usd")],
        )
        .map_err(|e| ApiError::InvalidResponse(format!("Bad CoinGecko URL {}: {}", endpoint, e)))
    }

    /// USD prices for up to [`MAX_ADDRESSES_PER_REQUEST`] contract addresses
    ///
    /// Keys are lowercased; addresses CoinGecko does not know, or reports
    /// without a `usd` field, are absent.
    pub async fn fetch_token_prices(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, f64>, ApiError> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }

        let url = self.token_price_url(addresses)?;
        logger::debug(
            LogTag::Api,
            &format!("[COINGECKO] Fetching {} token price(s) on {}", addresses.len(), self.platform),
        );

        let headers: Vec<(&str, &str)> = if self.api_key.is_empty() {
            Vec::new()
        } else {
            vec![(API_KEY_HEADER, self.api_key.as_str())]
        };

        let response: CoinGeckoTokenPriceResponse = self
            .http_client
            .get_json(PROVIDER_NAME, url, &headers, &self.limiter, &self.stats)
            .await?;

        Ok(response
            .into_iter()
            .filter_map(|(address, price)| price.usd.map(|usd| (address.to_lowercase(), usd)))
            .collect())
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn supports_batch(&self) -> bool {
        true
    }

    fn max_batch_size(&self) -> Option<usize> {
        Some(MAX_ADDRESSES_PER_REQUEST)
    }

    async fn fetch_price(&self, address: &str) -> Result<Option<f64>, ApiError> {
        let address = address.to_lowercase();
        let mut prices = self.fetch_token_prices(std::slice::from_ref(&address)).await?;
        Ok(prices.remove(&address))
    }

    async fn fetch_prices(&self, addresses: &[String]) -> Result<HashMap<String, f64>, ApiError> {
        self.fetch_token_prices(addresses).await
    }

    fn request_timeout(&self) -> Option<Duration> {
        Some(self.http_client.timeout())
    }

    fn stats(&self) -> ApiStats {
        self.stats.get_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::test_support::spawn_mock_server;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn client(base_url: String, api_key: &str) -> CoinGeckoClient {
        CoinGeckoClient::from_config(&CoinGeckoConfig {
            base_url,
            api_key: api_key.to_string(),
            timeout_secs: 2,
            rate_limit_per_minute: 0,
            ..CoinGeckoConfig::default()
        })
        .unwrap()
    }

    /// Echoes the request back inside the price map so tests can assert on it
    async fn token_price(
        Path(platform): Path<String>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Result<Json<Value>, StatusCode> {
        if headers.get(API_KEY_HEADER).map(|v| v.as_bytes()) != Some(b"cg-test".as_slice()) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        if platform != "base" || params.get("vs_currencies").map(String::as_str) != Some("usd") {
            return Err(StatusCode::BAD_REQUEST);
        }

        let mut body = serde_json::Map::new();
        for address in params.get("contract_addresses").cloned().unwrap_or_default().split(',') {
            match address {
                "0xaaa" => body.insert("0xAAA".to_string(), json!({ "usd": 1.01 })),
                "0xbbb" => body.insert("0xbbb".to_string(), json!({})),
                _ => None,
            };
        }
        Ok(Json(Value::Object(body)))
    }

    #[tokio::test]
    async fn test_batch_request_parses_prices() {
        let base = spawn_mock_server(
            Router::new().route("/simple/token_price/:platform", get(token_price)),
        )
        .await;
        let client = client(base, "cg-test");

        let prices = client
            .fetch_prices(&["0xAAA".to_string(), "0xbbb".to_string(), "0xccc".to_string()])
            .await
            .unwrap();

        // Keys lowercased, entries without usd dropped, unknown absent
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["0xaaa"], 1.01);

        assert_eq!(client.fetch_price("0xAAA").await.unwrap(), Some(1.01));
        assert_eq!(client.fetch_price("0xccc").await.unwrap(), None);

        let stats = client.stats();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.successful_requests, 3);
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let base = spawn_mock_server(
            Router::new().route("/simple/token_price/:platform", get(token_price)),
        )
        .await;
        let client = client(base, "wrong-key");

        let err = client.fetch_price("0xaaa").await.unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus { status: 401, .. }));
        assert_eq!(client.stats().failed_requests, 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let base = spawn_mock_server(Router::new().route(
            "/simple/token_price/:platform",
            get(|| async { "not json" }),
        ))
        .await;
        let client = client(base, "");

        let err = client.fetch_price("0xaaa").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let client = client("http://127.0.0.1:9".to_string(), "");
        assert!(client.fetch_prices(&[]).await.unwrap().is_empty());
        assert_eq!(client.stats().total_requests, 0);
    }
}
