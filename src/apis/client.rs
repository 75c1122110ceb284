/// Base HTTP client with timeout and rate limiting
use super::stats::ApiStatsTracker;
use super::ApiError;
use crate::logger::{self, LogTag};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use url::Url;

/// Rate limiter for API clients
///
/// Serializes requests through a single permit and spaces them by
/// `60 / max_per_minute` seconds. `max_per_minute == 0` disables spacing.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    last_request: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
    max_per_minute: usize,
}

impl RateLimiter {
    pub fn new(max_per_minute: usize) -> Self {
        let min_interval = if max_per_minute > 0 {
            Duration::from_secs_f64(60.0 / max_per_minute as f64)
        } else {
            Duration::ZERO
        };

        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            last_request: Arc::new(Mutex::new(None)),
            min_interval,
            max_per_minute,
        }
    }

    /// Wait until a request may be sent
    pub async fn acquire(&self) -> Result<RateLimitGuard, ApiError> {
        if self.min_interval.is_zero() {
            return Ok(RateLimitGuard { _permit: None });
        }

        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ApiError::RateLimited(e.to_string()))?;

        let mut last = self.last_request.lock().await;
        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());

        Ok(RateLimitGuard {
            _permit: Some(permit),
        })
    }

    pub fn max_per_minute(&self) -> usize {
        self.max_per_minute
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// RAII guard returned by [`RateLimiter::acquire`]
pub struct RateLimitGuard {
    _permit: Option<OwnedSemaphorePermit>,
}

/// HTTP client wrapper with a fixed request timeout
///
/// The timeout covers sending the request and decoding the body. Time spent
/// waiting on a [`RateLimiter`] is not counted.
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64) -> Result<Self, ApiError> {
        if timeout_secs == 0 {
            return Err(ApiError::Network(
                "Timeout must be greater than zero".to_string(),
            ));
        }

        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Lower the request timeout to `cap` if it is currently longer
    pub fn cap_timeout(&mut self, cap: Duration) {
        if !cap.is_zero() {
            self.timeout = self.timeout.min(cap);
        }
    }

    /// GET `url` with `headers` and decode a JSON body
    ///
    /// Waits for `limiter` first, then applies the request timeout. Records
    /// the outcome in `stats`. Non-2xx statuses, transport errors, timeouts
    /// and undecodable bodies all map to an [`ApiError`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        provider: &str,
        url: Url,
        headers: &[(&str, &str)],
        limiter: &RateLimiter,
        stats: &ApiStatsTracker,
    ) -> Result<T, ApiError> {
        let endpoint = url.path().to_string();
        let _guard = limiter.acquire().await?;

        logger::verbose(LogTag::Api, &format!("[{}] GET {}", provider, url));

        let start = Instant::now();
        let request = self.send_and_decode(url, headers, &endpoint);
        let result = match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(self.timeout)),
        };
        let elapsed_ms = start.elapsed().as_millis() as f64;

        stats.record_request(result.is_ok(), elapsed_ms);
        if let Err(e) = &result {
            logger::debug(
                LogTag::Api,
                &format!("[{}] {} failed after {}ms: {}", provider, endpoint, elapsed_ms, e),
            );
        }
        result
    }

    async fn send_and_decode<T: DeserializeOwned>(
        &self,
        url: Url,
        headers: &[(&str, &str)],
        endpoint: &str,
    ) -> Result<T, ApiError> {
        let mut builder = self
            .client
            .get(url)
            .header("accept", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout)
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_interval() {
        assert_eq!(RateLimiter::new(60).min_interval(), Duration::from_secs(1));
        assert_eq!(RateLimiter::new(0).min_interval(), Duration::ZERO);
        assert_eq!(RateLimiter::new(30).max_per_minute(), 30);
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(600); // 100ms apart
        let start = Instant::now();
        drop(limiter.acquire().await.unwrap());
        drop(limiter.acquire().await.unwrap());
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(HttpClient::new(0).is_err());
        assert_eq!(HttpClient::new(5).unwrap().timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_cap_timeout_only_lowers() {
        let mut client = HttpClient::new(5).unwrap();
        client.cap_timeout(Duration::from_secs(10));
        assert_eq!(client.timeout(), Duration::from_secs(5));
        client.cap_timeout(Duration::from_millis(350));
        assert_eq!(client.timeout(), Duration::from_millis(350));
        client.cap_timeout(Duration::ZERO);
        assert_eq!(client.timeout(), Duration::from_millis(350));
    }
}
