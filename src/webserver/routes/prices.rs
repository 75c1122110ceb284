//! `/api/prices`: cached token price lookups
//!
//! - `GET  /api/prices?token=<address>` → `{price, source, cached}`
//! - `POST /api/prices` with `{tokens: [...]}` → `{prices: {address: {price, source}}}`
//! - `GET  /api/prices/stats` → cache and provider statistics
//!
//! "No price" is a 200 with `price: 0, source: "none"`; only malformed
//! input (or more than `server.max_batch_tokens` addresses) is a 400.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    apis::ApiStats,
    logger::{self, LogTag},
    prices::{CacheMetrics, PriceQuote},
    webserver::{
        state::AppState,
        utils::{error_response, success_response, INTERNAL_ERROR_MESSAGE},
    },
};

pub const MISSING_TOKEN_MESSAGE: &str = "Missing token address";
pub const INVALID_TOKENS_MESSAGE: &str = "Invalid token addresses";
pub const INVALID_QUERY_MESSAGE: &str = "Invalid query parameters";
pub const TOO_MANY_TOKENS_MESSAGE: &str = "Too many token addresses";

// =============================================================================
// REQUEST / RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchPriceResponse {
    pub prices: HashMap<String, PriceQuote>,
}

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub metrics: CacheMetrics,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct ProviderStatsResponse {
    pub name: &'static str,
    pub role: &'static str,
    #[serde(flatten)]
    pub stats: ApiStats,
}

#[derive(Debug, Serialize)]
pub struct PriceStatsResponse {
    pub cache: CacheStatsResponse,
    pub providers: Vec<ProviderStatsResponse>,
}

// =============================================================================
// ROUTES
// =============================================================================

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/prices", get(get_price).post(get_batch_prices))
        .route("/prices/stats", get(get_price_stats))
}

/// Single token price
async fn get_price(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PriceQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            logger::debug(
                LogTag::Webserver,
                &format!("Rejected price query: {}", rejection.body_text()),
            );
            return error_response(StatusCode::BAD_REQUEST, INVALID_QUERY_MESSAGE);
        }
    };

    let Some(token) = query.token.filter(|t| !t.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_TOKEN_MESSAGE);
    };

    success_response(state.prices.get_price(&token).await)
}

/// Batch token prices
async fn get_batch_prices(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let tokens = match parse_batch_body(&body) {
        Ok(tokens) => tokens,
        Err(response) => return response,
    };

    let max_tokens = state.config.server.max_batch_tokens;
    if tokens.len() > max_tokens {
        logger::warning(
            LogTag::Webserver,
            &format!("Batch price request for {} tokens exceeds limit of {}", tokens.len(), max_tokens),
        );
        return error_response(StatusCode::BAD_REQUEST, TOO_MANY_TOKENS_MESSAGE);
    }

    logger::debug(
        LogTag::Webserver,
        &format!("Batch price request for {} token(s)", tokens.len()),
    );

    let prices = state.prices.get_prices(&tokens).await;
    success_response(BatchPriceResponse { prices })
}

/// Cache and provider statistics
async fn get_price_stats(State(state): State<Arc<AppState>>) -> Response {
    let metrics = state.prices.cache().metrics();
    let cache = CacheStatsResponse {
        hit_rate: metrics.hit_rate(),
        ttl_secs: state.prices.cache().ttl().as_secs(),
        metrics,
    };

    let providers = state
        .prices
        .provider_stats()
        .into_iter()
        .enumerate()
        .map(|(index, (name, stats))| ProviderStatsResponse {
            name,
            role: crate::prices::PriceSource::for_chain_index(index).as_str(),
            stats,
        })
        .collect();

    success_response(PriceStatsResponse { cache, providers })
}

/// Extract `tokens` from a batch request body
///
/// Missing body, missing `tokens`, a non-array, non-string or blank entries,
/// or an empty array are client errors. A body that is not JSON at all is treated
/// as an unexpected failure.
fn parse_batch_body(body: &[u8]) -> Result<Vec<String>, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(error_response(StatusCode::BAD_REQUEST, INVALID_TOKENS_MESSAGE));
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| {
        logger::error(
            LogTag::Webserver,
            &format!("Batch price request body is not JSON: {}", e),
        );
        error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    })?;

    let tokens = value
        .get("tokens")
        .and_then(Value::as_array)
        .filter(|tokens| !tokens.is_empty())
        .and_then(|tokens| {
            tokens
                .iter()
                .map(|t| {
                    t.as_str()
                        .filter(|t| !t.trim().is_empty())
                        .map(str::to_string)
                })
                .collect::<Option<Vec<String>>>()
        });

    tokens.ok_or_else(|| error_response(StatusCode::BAD_REQUEST, INVALID_TOKENS_MESSAGE))
}
