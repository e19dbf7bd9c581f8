use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header::ORIGIN};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, instrument, trace, warn};

use super::protocol::FeedRequest;
use super::{FeedConnection, FeedConnector};
use crate::error::FeedError;

pub const DEFAULT_FEED_URL: &str = "wss://api.hitbtc.com/api/2/ws";
pub const DEFAULT_FEED_ORIGIN: &str = "https://localhost/";
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Dials the upstream websocket with a fixed `Origin` header.
#[derive(Debug, Clone)]
pub struct WsFeedConnector {
    pub url: String,
    pub origin: String,
    pub reply_timeout: Duration,
}

impl WsFeedConnector {
    pub fn new(url: String, origin: String, reply_timeout: Duration) -> Self {
        Self {
            url,
            origin,
            reply_timeout,
        }
    }
}

impl Default for WsFeedConnector {
    fn default() -> Self {
        Self::new(
            DEFAULT_FEED_URL.to_string(),
            DEFAULT_FEED_ORIGIN.to_string(),
            DEFAULT_REPLY_TIMEOUT,
        )
    }
}

#[async_trait]
impl FeedConnector for WsFeedConnector {
    type Connection = WsFeedConnection;

    #[instrument(skip(self), fields(url = %self.url), level = "debug")]
    async fn open(&self) -> Result<WsFeedConnection, FeedError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| FeedError::InvalidRequest(e.to_string()))?;

        let origin = HeaderValue::from_str(&self.origin)
            .map_err(|e| FeedError::InvalidRequest(e.to_string()))?;
        request.headers_mut().insert(ORIGIN, origin);

        let (stream, _) = connect_async(request).await.map_err(FeedError::Connect)?;
        debug!("feed websocket connected");

        Ok(WsFeedConnection {
            stream,
            reply_timeout: self.reply_timeout,
            closed: false,
        })
    }
}

pub struct WsFeedConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    reply_timeout: Duration,
    closed: bool,
}

impl WsFeedConnection {
    /// Next data frame, whole. Control frames are skipped; tungstenite answers
    /// pings on its own while we keep reading.
    async fn next_data_frame(&mut self) -> Result<String, FeedError> {
        while let Some(msg) = self.stream.next().await {
            match msg? {
                Message::Text(text) => return Ok(text.as_str().to_owned()),
                Message::Binary(bytes) => return Ok(String::from_utf8_lossy(&bytes).into_owned()),
                Message::Close(frame) => {
                    debug!(frame = ?frame, "feed sent close frame");
                    self.closed = true;
                    return Err(FeedError::Closed);
                }
                other => trace!(msg_type = ?other, "skipping control frame"),
            }
        }

        self.closed = true;
        Err(FeedError::Closed)
    }
}

#[async_trait]
impl FeedConnection for WsFeedConnection {
    #[instrument(skip(self, req), fields(method = req.method()), level = "trace")]
    async fn request(&mut self, req: &FeedRequest) -> Result<String, FeedError> {
        if self.closed {
            return Err(FeedError::Closed);
        }

        let text = req.to_json()?;
        trace!(payload = %text, "sending feed request");
        self.stream.send(Message::Text(text.into())).await?;

        let raw = tokio::time::timeout(self.reply_timeout, self.next_data_frame())
            .await
            .map_err(|_| FeedError::Timeout(self.reply_timeout))??;

        trace!(raw = %raw, "feed reply");
        Ok(raw)
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.stream.close(None).await {
            warn!(error = ?e, "error while closing feed websocket");
        }
    }
}
