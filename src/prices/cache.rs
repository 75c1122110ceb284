/// TTL price cache keyed by lowercase token address
///
/// Entries are written on every successful fetch and only become invisible
/// once older than the TTL; an expired entry found on read is dropped.
/// Writers race last-write-wins, which is fine for price snapshots.
use super::types::{normalize_address, PriceQuote, PriceSource};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default time-to-live for cached prices
pub const DEFAULT_PRICE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq)]
pub struct PriceCacheEntry {
    pub price: f64,
    pub timestamp: Instant,
    pub source: PriceSource,
    /// Name of the provider that produced the price
    pub provider: &'static str,
}

impl PriceCacheEntry {
    fn is_valid_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.timestamp) < ttl
    }

    pub fn quote(&self) -> PriceQuote {
        PriceQuote {
            price: self.price,
            source: self.source,
        }
    }
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheMetrics {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub inserts: u64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
pub struct PriceCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, PriceCacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    inserts: AtomicU64,
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_TTL)
    }
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Valid entry for `address`, or `None` when missing or expired
    pub fn get(&self, address: &str) -> Option<PriceCacheEntry> {
        self.get_at(address, Instant::now())
    }

    /// [`get`](Self::get) evaluated at an explicit instant
    pub fn get_at(&self, address: &str, now: Instant) -> Option<PriceCacheEntry> {
        let key = normalize_address(address);

        let expired = {
            let entries = self.entries.read();
            match entries.get(&key) {
                Some(entry) if entry.is_valid_at(now, self.ttl) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.clone());
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            let mut entries = self.entries.write();
            // Re-check: a writer may have refreshed the entry in between
            if entries
                .get(&key)
                .is_some_and(|entry| !entry.is_valid_at(now, self.ttl))
            {
                entries.remove(&key);
                self.expirations.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a fresh price for `address`
    ///
    /// `PriceSource::None` and non-positive prices are never cached so a
    /// failed lookup is retried on the next request.
    pub fn insert(&self, address: &str, price: f64, source: PriceSource, provider: &'static str) {
        self.insert_at(address, price, source, provider, Instant::now());
    }

    /// [`insert`](Self::insert) stamped with an explicit instant
    pub fn insert_at(
        &self,
        address: &str,
        price: f64,
        source: PriceSource,
        provider: &'static str,
        timestamp: Instant,
    ) {
        if source == PriceSource::None || super::types::usable_price(price).is_none() {
            return;
        }

        let entry = PriceCacheEntry {
            price,
            timestamp,
            source,
            provider,
        };
        self.entries.write().insert(normalize_address(address), entry);
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Split `addresses` into valid cached quotes and addresses needing a fetch
    ///
    /// Addresses are normalized; duplicates collapse to one key.
    pub fn partition(&self, addresses: &[String]) -> (HashMap<String, PriceQuote>, Vec<String>) {
        let now = Instant::now();
        let mut cached = HashMap::new();
        let mut missing: Vec<String> = Vec::new();

        for address in addresses {
            let key = normalize_address(address);
            if cached.contains_key(&key) || missing.contains(&key) {
                continue;
            }
            match self.get_at(&key, now) {
                Some(entry) => {
                    cached.insert(key, entry.quote());
                }
                None => missing.push(key),
            }
        }

        (cached, missing)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
        }
    }
}
