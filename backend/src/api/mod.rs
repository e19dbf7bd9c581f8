//! Read-only HTTP query surface over the currency cache.
//!
//! Routes:
//!   • `GET /currency/all`       every cached record, keyed by symbol
//!   • `GET /currency/{symbol}`  one record, or a typed 404/503
//!   • `GET /subscriptions`      per-symbol subscription state
//!   • `GET /health`             liveness plus feed counters
//!
//! Handlers never touch the feed; they only copy out of the cache and the
//! state board.

pub mod error;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument};

use market::counters::FeedCounters;
use market::manager::StateBoard;
use market::{CurrencyCache, CurrencyRecord, SubscriptionState};

use crate::error::AppError;
use error::ApiError;

#[derive(Clone)]
pub struct QueryState {
    pub cache: CurrencyCache,
    pub states: StateBoard,
    pub counters: FeedCounters,
}

pub fn router(state: QueryState) -> Router {
    Router::new()
        .route("/currency/all", get(get_all))
        .route("/currency/:symbol", get(get_one))
        .route("/subscriptions", get(subscriptions))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    addr: &str,
    state: QueryState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "query surface listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("query surface stopped");
    Ok(())
}

async fn get_all(State(q): State<QueryState>) -> Json<HashMap<String, CurrencyRecord>> {
    Json(q.cache.get_all())
}

#[instrument(skip(q), level = "debug")]
async fn get_one(
    State(q): State<QueryState>,
    Path(symbol): Path<String>,
) -> Result<Json<CurrencyRecord>, ApiError> {
    if let Some(record) = q.cache.get(&symbol) {
        return Ok(Json(record));
    }

    match q.states.get(&symbol) {
        Some(state) => {
            debug!(state = ?state, "symbol tracked but not cached");
            Err(ApiError::Unavailable { symbol, state })
        }
        None => Err(ApiError::NotFound(symbol)),
    }
}

async fn subscriptions(State(q): State<QueryState>) -> Json<HashMap<String, SubscriptionState>> {
    Json(q.states.snapshot())
}

async fn health(State(q): State<QueryState>) -> Json<Value> {
    let states = q.states.snapshot();
    let streaming = states.values().filter(|s| s.is_streaming()).count();

    Json(json!({
        "status": "ok",
        "tracked": states.len(),
        "streaming": streaming,
        "cached": q.cache.len(),
        "counters": q.counters.snapshot(),
    }))
}
