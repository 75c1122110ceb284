/// Shared application state passed to all route handlers
use crate::config::Config;
use crate::prices::PriceService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Config>,

    /// Price lookup service owning the cache
    pub prices: Arc<PriceService>,

    /// Server startup time
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: Config, prices: PriceService) -> Self {
        Self {
            config: Arc::new(config),
            prices: Arc::new(prices),
            startup_time: chrono::Utc::now(),
        }
    }

    /// Server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time)
            .num_seconds()
            .max(0) as u64
    }
}
