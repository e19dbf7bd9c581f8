use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite;

use market::error::FeedError;
use market::feed::protocol::FeedRequest;
use market::feed::{FeedConnection, FeedConnector};

pub enum Push {
    Frame(String),
    /// Fail the pending read as if the socket died.
    Disconnect,
}

/// Scripted upstream: answers handshake requests from fixed tables and hands
/// out ticker frames only when the test pushes them.
#[derive(Default)]
pub struct MockFeed {
    symbols: HashMap<String, (String, String)>,
    currencies: HashMap<String, String>,
    receivers: HashMap<String, Arc<Mutex<mpsc::UnboundedReceiver<Push>>>>,
    senders: HashMap<String, mpsc::UnboundedSender<Push>>,

    pub opens: AtomicUsize,
    pub symbol_lookups: AtomicUsize,
    fail_opens: AtomicUsize,
}

impl MockFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, symbol: &str, base: &str, fee: &str) -> Self {
        self.symbols
            .insert(symbol.into(), (base.into(), fee.into()));

        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(symbol.into(), tx);
        self.receivers
            .insert(symbol.into(), Arc::new(Mutex::new(rx)));
        self
    }

    pub fn with_currency(mut self, id: &str, full_name: &str) -> Self {
        self.currencies.insert(id.into(), full_name.into());
        self
    }

    pub fn failing_opens(self, n: usize) -> Self {
        self.fail_opens.store(n, Ordering::SeqCst);
        self
    }

    pub fn push(&self, symbol: &str, raw: &str) {
        self.senders[symbol]
            .send(Push::Frame(raw.to_string()))
            .expect("push channel open");
    }

    pub fn disconnect(&self, symbol: &str) {
        self.senders[symbol]
            .send(Push::Disconnect)
            .expect("push channel open");
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn symbol_lookups(&self) -> usize {
        self.symbol_lookups.load(Ordering::SeqCst)
    }
}

pub struct MockConnector {
    pub feed: Arc<MockFeed>,
}

pub struct MockConnection {
    feed: Arc<MockFeed>,
}

#[async_trait]
impl FeedConnector for MockConnector {
    type Connection = MockConnection;

    async fn open(&self) -> Result<MockConnection, FeedError> {
        self.feed.opens.fetch_add(1, Ordering::SeqCst);

        let failed = self
            .feed
            .fail_opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(FeedError::Connect(tungstenite::Error::ConnectionClosed));
        }

        Ok(MockConnection {
            feed: Arc::clone(&self.feed),
        })
    }
}

#[async_trait]
impl FeedConnection for MockConnection {
    async fn request(&mut self, req: &FeedRequest) -> Result<String, FeedError> {
        match req {
            FeedRequest::GetSymbol { symbol } => {
                self.feed.symbol_lookups.fetch_add(1, Ordering::SeqCst);

                Ok(match self.feed.symbols.get(symbol) {
                    Some((base, fee)) => {
                        json!({ "result": { "baseCurrency": base, "feeCurrency": fee } })
                    }
                    None => json!({ "error": { "code": 2001, "message": "Symbol not found" } }),
                }
                .to_string())
            }
            FeedRequest::GetCurrency { currency } => Ok(match self.feed.currencies.get(currency) {
                Some(name) => json!({ "result": { "id": currency, "fullName": name } }),
                None => json!({ "result": { "id": currency } }),
            }
            .to_string()),
            FeedRequest::SubscribeTicker { symbol } => {
                let Some(rx) = self.feed.receivers.get(symbol) else {
                    return std::future::pending().await;
                };

                let mut rx = rx.lock().await;
                match rx.recv().await {
                    Some(Push::Frame(raw)) => Ok(raw),
                    Some(Push::Disconnect) => Err(FeedError::Closed),
                    None => std::future::pending().await,
                }
            }
        }
    }

    async fn close(&mut self) {}
}
