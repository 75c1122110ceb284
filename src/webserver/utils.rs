/// Shared response helpers for route handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// Generic body for unexpected failures
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// `{ "error": message }` with the given status
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// 200 with `data` serialized as JSON
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}
