use axum::{extract::State, response::Response, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::webserver::{state::AppState, utils::success_response};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// Liveness probe
async fn health(State(state): State<Arc<AppState>>) -> Response {
    success_response(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
    })
}
