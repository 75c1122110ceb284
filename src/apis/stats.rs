/// Per-provider request statistics
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApiStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time_ms: f64,
}

impl ApiStats {
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64
        }
    }
}

/// Lock-free request counters shared by a client
#[derive(Debug, Default)]
pub struct ApiStatsTracker {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    // Sum of response times in microseconds
    total_response_us: AtomicU64,
}

impl ApiStatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, success: bool, response_time_ms: f64) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        let micros = (response_time_ms.max(0.0) * 1000.0) as u64;
        self.total_response_us.fetch_add(micros, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> ApiStats {
        let total = self.total.load(Ordering::Relaxed);
        let average_response_time_ms = if total == 0 {
            0.0
        } else {
            self.total_response_us.load(Ordering::Relaxed) as f64 / 1000.0 / total as f64
        };

        ApiStats {
            total_requests: total,
            successful_requests: self.successful.load(Ordering::Relaxed),
            failed_requests: self.failed.load(Ordering::Relaxed),
            average_response_time_ms,
        }
    }
}
