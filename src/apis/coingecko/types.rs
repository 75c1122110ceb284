/// CoinGecko response types
use serde::Deserialize;
use std::collections::HashMap;

/// One entry of `/simple/token_price/{platform}`
#[derive(Debug, Clone, Deserialize)]
pub struct CoinGeckoTokenPrice {
    #[serde(default)]
    pub usd: Option<f64>,
}

/// Contract address → price map as returned by CoinGecko
pub type CoinGeckoTokenPriceResponse = HashMap<String, CoinGeckoTokenPrice>;
