/// Upstream price API clients
///
/// Each client owns its HTTP client, rate limiter and request statistics.
/// Errors never leave the price service; they are logged and the next
/// provider in the chain is tried.
pub mod client;
pub mod coingecko;
pub mod moralis;
pub mod stats;

pub use coingecko::CoinGeckoClient;
pub use moralis::MoralisClient;
pub use stats::{ApiStats, ApiStatsTracker};

use std::time::Duration;

/// Error returned by an upstream price API
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status} from {endpoint}")]
    HttpStatus { endpoint: String, status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Rate limiter error: {0}")]
    RateLimited(String),

    #[error("API disabled")]
    Disabled,
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral local port and return its base URL
    pub async fn spawn_mock_server(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
