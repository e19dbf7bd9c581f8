use serde::Deserialize;
use std::time::Duration;

use market::feed::ws::{DEFAULT_FEED_ORIGIN, DEFAULT_FEED_URL};

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    // =========================
    // Feed configuration
    // =========================
    /// Websocket endpoint of the market-data feed.
    pub feed_url: String,

    /// `Origin` header sent on every feed connection.
    pub feed_origin: String,

    /// Upper bound on any single reply or push read.
    ///
    /// Replies are matched to requests by order only, so an unanswered
    /// request would otherwise stall its subscription forever. Expiry is
    /// treated as a transport failure and triggers a reconnect.
    pub reply_timeout: Duration,

    /// First reconnect delay after a subscription fails.
    pub backoff_initial: Duration,

    /// Reconnect delays double up to this cap.
    pub backoff_max: Duration,

    // =========================
    // Process configuration
    // =========================
    /// JSON file listing the symbols to track (`{"Symbolscur": [...]}`).
    pub symbols_file: String,

    /// Listen address of the query surface.
    pub http_bind: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let millis = |key: &'static str, default: u64| -> Result<Duration, AppError> {
            match lookup(key) {
                None => Ok(Duration::from_millis(default)),
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|e| AppError::InvalidConfig {
                        key,
                        value: raw.clone(),
                        reason: e.to_string(),
                    }),
            }
        };

        Ok(Self {
            feed_url: string("FEED_URL", DEFAULT_FEED_URL),
            feed_origin: string("FEED_ORIGIN", DEFAULT_FEED_ORIGIN),
            reply_timeout: millis("REPLY_TIMEOUT_MS", 30_000)?,
            backoff_initial: millis("BACKOFF_INITIAL_MS", 500)?,
            backoff_max: millis("BACKOFF_MAX_MS", 30_000)?,

            symbols_file: string("SYMBOLS_FILE", "conf.json"),
            http_bind: string("HTTP_BIND", "0.0.0.0:8080"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SymbolsFile {
    #[serde(rename = "Symbolscur", default)]
    symbols: Vec<String>,
}

/// Parse the symbols file body. Blank entries are dropped; duplicates are
/// kept, the subscription manager de-duplicates.
pub fn parse_symbols(raw: &str) -> Result<Vec<String>, serde_json::Error> {
    let file: SymbolsFile = serde_json::from_str(raw)?;

    Ok(file
        .symbols
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

pub fn load_symbols(path: &str) -> Result<Vec<String>, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|source| AppError::SymbolsIo {
        path: path.to_string(),
        source,
    })?;

    parse_symbols(&raw).map_err(|source| AppError::SymbolsJson {
        path: path.to_string(),
        source,
    })
}
