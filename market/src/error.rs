use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("feed connection failed: {0}")]
    Connect(#[source] tungstenite::Error),

    #[error("feed transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("no reply from feed within {0:?}")]
    Timeout(Duration),

    #[error("feed connection closed by peer")]
    Closed,

    #[error("malformed feed message: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot encode feed request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("feed rejected request ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("handshake for {0} resolved no identity fields")]
    Unresolved(String),

    #[error("invalid feed request: {0}")]
    InvalidRequest(String),
}
