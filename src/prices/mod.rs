//! Token price lookup with a TTL cache and provider fallback
//!
//! ```rust,ignore
//! let service = PriceService::from_config(&config)?;
//! let lookup = service.get_price("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913").await;
//! let batch = service.get_prices(&addresses).await;
//! ```

pub mod cache;
pub mod provider;
pub mod service;
pub mod types;
pub mod valuation;

pub use cache::{CacheMetrics, PriceCache, PriceCacheEntry, DEFAULT_PRICE_TTL};
pub use provider::PriceProvider;
pub use service::{PriceService, ALL_SOURCES_FAILED};
pub use types::{normalize_address, PriceLookup, PriceQuote, PriceSource};
pub use valuation::{format_usd, value_wallet, TokenHolding, TokenValue, WalletValue};
