/// Price result types shared by the cache, the service and the HTTP routes
use serde::{Deserialize, Serialize};

/// Which position in the provider chain produced a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// First provider in the chain
    Primary,
    /// Any later provider
    Fallback,
    /// No provider produced a price
    None,
}

impl PriceSource {
    /// Source label for the provider at `index` in the chain
    pub fn for_chain_index(index: usize) -> Self {
        if index == 0 {
            PriceSource::Primary
        } else {
            PriceSource::Fallback
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::Primary => "primary",
            PriceSource::Fallback => "fallback",
            PriceSource::None => "none",
        }
    }
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-address result of a batch lookup
///
/// `price == 0.0` with `source == None` is the "no price found" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    pub source: PriceSource,
}

impl PriceQuote {
    pub fn unavailable() -> Self {
        Self {
            price: 0.0,
            source: PriceSource::None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.source != PriceSource::None
    }

    /// The price as an option, `None` for the sentinel
    pub fn price(&self) -> Option<f64> {
        self.is_available().then_some(self.price)
    }
}

/// Result of a single-address lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLookup {
    pub price: f64,
    pub source: PriceSource,
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PriceLookup {
    pub fn quote(&self) -> PriceQuote {
        PriceQuote {
            price: self.price,
            source: self.source,
        }
    }
}

/// Normalize a token address for cache and upstream use
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Upstream values that count as a usable price
pub(crate) fn usable_price(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}
