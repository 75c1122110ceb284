/// Moralis API client (fallback price source)
///
/// API Documentation: https://docs.moralis.com/web3-data-api/evm/reference/get-token-price
///
/// Endpoint used:
/// - /erc20/{address}/price?chain={chain}
///
/// Single-address only; the price service fans out concurrently.
pub mod types;

use self::types::MoralisTokenPrice;
use crate::apis::client::{HttpClient, RateLimiter};
use crate::apis::stats::{ApiStats, ApiStatsTracker};
use crate::apis::ApiError;
use crate::config::MoralisConfig;
use crate::logger::{self, LogTag};
use crate::prices::PriceProvider;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

pub const PROVIDER_NAME: &str = "moralis";

const API_KEY_HEADER: &str = "X-API-Key";

pub struct MoralisClient {
    http_client: HttpClient,
    limiter: RateLimiter,
    stats: ApiStatsTracker,
    base_url: String,
    api_key: String,
    chain: String,
}

impl MoralisClient {
    pub fn from_config(config: &MoralisConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http_client: HttpClient::new(config.timeout_secs)?,
            limiter: RateLimiter::new(config.rate_limit_per_minute),
            stats: ApiStatsTracker::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            chain: config.chain.clone(),
        })
    }

    /// Lower the per-request timeout (rate-limit waits excluded)
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.http_client.cap_timeout(timeout);
        self
    }

    /// `{base}/erc20/{address}/price?chain=`, with the address as one encoded segment
    fn token_price_url(&self, address: &str) -> Result<Url, ApiError> {
        let bad_url = |reason: &str| {
            ApiError::InvalidResponse(format!("Bad Moralis URL for {:?}: {}", address, reason))
        };

        let address = address.trim();
        if address.is_empty() || address == "." || address == ".." {
            return Err(bad_url("not a token address"));
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| bad_url(&e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| bad_url("base URL cannot have a path"))?
            .pop_if_empty()
            .push("erc20")
            .push(address)
            .push("price");
        url.query_pairs_mut().append_pair("chain", &self.chain);
        Ok(url)
    }

    /// Raw price response for one ERC-20 contract
    pub async fn fetch_token_price(&self, address: &str) -> Result<MoralisTokenPrice, ApiError> {
        let url = self.token_price_url(address)?;
        logger::debug(
            LogTag::Api,
            &format!("[MORALIS] Fetching price for {} on {}", address, self.chain),
        );

        self.http_client
            .get_json(
                PROVIDER_NAME,
                url,
                &[(API_KEY_HEADER, self.api_key.as_str())],
                &self.limiter,
                &self.stats,
            )
            .await
    }
}

#[async_trait]
impl PriceProvider for MoralisClient {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch_price(&self, address: &str) -> Result<Option<f64>, ApiError> {
        Ok(self.fetch_token_price(address).await?.price())
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
    use std::collections::HashMap;

    async fn token_price(
        Path(address): Path<String>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Result<Json<Value>, StatusCode> {
        if headers.get(API_KEY_HEADER).is_none() {
            return Err(StatusCode::UNAUTHORIZED);
        }
        if params.get("chain").map(String::as_str) != Some("base") {
            return Err(StatusCode::BAD_REQUEST);
        }
        match address.as_str() {
            "0xaaa" => Ok(Json(json!({ "usdPrice": 0.42, "usdPriceFormatted": "0.42" }))),
            "0xbbb" => Ok(Json(json!({ "usdPriceFormatted": "1.75" }))),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    fn client(base_url: String) -> MoralisClient {
        MoralisClient::from_config(&MoralisConfig {
            base_url,
            api_key: "moralis-test".to_string(),
            timeout_secs: 2,
            ..MoralisConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_price() {
        let base =
            spawn_mock_server(Router::new().route("/erc20/:address/price", get(token_price))).await;
        let client = client(base);

        assert_eq!(client.fetch_price("0xaaa").await.unwrap(), Some(0.42));
        assert_eq!(client.fetch_price("0xbbb").await.unwrap(), Some(1.75));
        assert!(matches!(
            client.fetch_price("0xccc").await.unwrap_err(),
            ApiError::HttpStatus { status: 404, .. }
        ));

        let stats = client.stats();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.failed_requests, 1);
    }

    #[tokio::test]
    async fn test_default_fetch_prices_is_per_address() {
        let base =
            spawn_mock_server(Router::new().route("/erc20/:address/price", get(token_price))).await;
        let client = client(base);

        let prices = client
            .fetch_prices(&["0xaaa".to_string(), "0xbbb".to_string()])
            .await
            .unwrap();
        assert_eq!(prices.len(), 2);
        assert!(!client.supports_batch());
        assert_eq!(client.stats().total_requests, 2);
    }

    #[test]
    fn test_address_stays_in_one_path_segment() {
        let client = client("http://127.0.0.1:9/api/v2.2".to_string());

        let url = client.token_price_url("0xAbC").unwrap();
        assert_eq!(url.path(), "/api/v2.2/erc20/0xAbC/price");
        assert_eq!(url.query(), Some("chain=base"));

        let url = client.token_price_url("../../wallets/0xvictim/x").unwrap();
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 5);
        assert_eq!(&segments[..3], &["api", "v2.2", "erc20"]);
        assert_eq!(segments[4], "price");
        assert!(!segments[3].contains('/'));

        for address in ["", "  ", ".", ".."] {
            assert!(client.token_price_url(address).is_err(), "address: {:?}", address);
        }
    }

    #[tokio::test]
    async fn test_traversal_address_cannot_reach_other_routes() {
        let base = spawn_mock_server(
            Router::new()
                .route("/erc20/:address/price", get(token_price))
                .route("/wallets/*rest", get(|| async { Json(json!({ "usdPrice": 7.0 })) })),
        )
        .await;
        let client = client(base);

        let result = client.fetch_price("../wallets/0xvictim/x").await;
        assert!(matches!(result, Err(ApiError::HttpStatus { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) is not listening locally
        let client = client("http://127.0.0.1:9".to_string());
        let err = client.fetch_price("0xaaa").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout(_)));
    }
}
