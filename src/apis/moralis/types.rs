/// Moralis response types
use serde::Deserialize;
use serde_json::Value;

/// Body of `/erc20/{address}/price`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoralisTokenPrice {
    #[serde(default)]
    pub usd_price: Option<f64>,
    /// Sent as a string by the API, occasionally as a number
    #[serde(default)]
    pub usd_price_formatted: Option<Value>,
}

impl MoralisTokenPrice {
    /// `usdPrice` when present and non-zero, otherwise `usdPriceFormatted`
    pub fn price(&self) -> Option<f64> {
        let formatted = || match self.usd_price_formatted.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };

        self.usd_price.filter(|p| *p != 0.0).or_else(formatted)
    }
}
