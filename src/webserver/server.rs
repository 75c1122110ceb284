/// Axum webserver implementation
///
/// Server lifecycle: bind, serve, graceful shutdown on [`shutdown`].
use axum::{
    http::StatusCode,
    response::Response,
    Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::{
    logger::{self, LogTag},
    webserver::{
        routes,
        state::AppState,
        utils::{error_response, INTERNAL_ERROR_MESSAGE},
    },
};

/// Global shutdown notifier
static SHUTDOWN_NOTIFY: once_cell::sync::Lazy<Arc<Notify>> =
    once_cell::sync::Lazy::new(|| Arc::new(Notify::new()));

/// Start the webserver
///
/// Blocks until [`shutdown`] is called.
pub async fn start_server(state: AppState) -> Result<(), String> {
    let bind = state.config.bind_address();
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| format!("Invalid bind address {}: {}", bind, e))?;

    let app = build_app(Arc::new(state));

    let listener = TcpListener::bind(&addr).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => format!(
            "Failed to bind to {}: Address already in use\n\
             Another instance may be running, or choose a different port with --port.",
            addr
        ),
        std::io::ErrorKind::PermissionDenied => format!(
            "Failed to bind to {}: Permission denied\n\
             Port {} requires elevated privileges; use a port above 1024.",
            addr,
            addr.port()
        ),
        _ => format!("Failed to bind to {}: {}", addr, e),
    })?;

    logger::info(
        LogTag::Webserver,
        &format!("Price proxy listening on http://{}/api/prices", addr),
    );

    let shutdown_signal = async {
        SHUTDOWN_NOTIFY.notified().await;
        logger::debug(LogTag::Webserver, "Received shutdown signal, stopping webserver...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    logger::info(LogTag::Webserver, "Webserver stopped gracefully");
    Ok(())
}

/// Trigger webserver shutdown
pub fn shutdown() {
    logger::debug(LogTag::Webserver, "Triggering webserver shutdown...");
    // notify_one stores a permit if the server is not waiting yet
    SHUTDOWN_NOTIFY.notify_one();
}

/// Router with CORS and panic-to-500 middleware
pub fn build_app(state: Arc<AppState>) -> Router {
    routes::create_router(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    logger::error(LogTag::Webserver, &format!("Handler panicked: {}", detail));
    error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
}
