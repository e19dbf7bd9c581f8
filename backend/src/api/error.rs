use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use market::SubscriptionState;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Never tracked.
    #[error("symbol {0} is not tracked")]
    NotFound(String),

    /// Tracked, but no completed handshake yet (or the feed keeps failing).
    #[error("symbol {symbol} is not available yet")]
    Unavailable {
        symbol: String,
        state: SubscriptionState,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::NotFound(symbol) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "not_found", "symbol": symbol }),
            ),
            ApiError::Unavailable { symbol, state } => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "unavailable", "symbol": symbol, "state": state }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
