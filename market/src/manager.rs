//! SubscriptionManager
//!
//! Owns the live subscriptions that keep the currency cache fresh.
//! Responsibilities:
//!   • Claim each symbol exactly once (atomic against the registry)
//!   • Spawn one supervised task per symbol: connect, handshake, stream
//!   • Restart failed subscriptions with exponential backoff
//!   • Publish per-symbol subscription state for readers
//!   • Cancel and await every task on shutdown
//!
//! Like the other long-lived services it is Arc-managed so spawned tasks can
//! hold `self`.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, warn};

use crate::backoff::Backoff;
use crate::cache::CurrencyCache;
use crate::counters::FeedCounters;
use crate::error::FeedError;
use crate::feed::{FeedConnection, FeedConnector};
use crate::types::SubscriptionState;
use crate::{handshake, ticker};

/// A session that streamed at least this long resets the reconnect backoff.
pub const STABLE_SESSION: Duration = Duration::from_secs(60);

/// Latest known state of every claimed symbol.
#[derive(Clone, Default)]
pub struct StateBoard {
    inner: Arc<RwLock<HashMap<String, SubscriptionState>>>,
}

impl StateBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, symbol: &str, state: SubscriptionState) {
        self.inner.write().insert(symbol.to_string(), state);
    }

    pub fn get(&self, symbol: &str) -> Option<SubscriptionState> {
        self.inner.read().get(symbol).cloned()
    }

    pub fn snapshot(&self) -> HashMap<String, SubscriptionState> {
        self.inner.read().clone()
    }
}

struct SubscriptionHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

pub struct SubscriptionManager<C> {
    connector: Arc<C>,
    cache: CurrencyCache,
    states: StateBoard,
    counters: FeedCounters,
    backoff: Backoff,
    registry: Mutex<HashMap<String, SubscriptionHandle>>,
    closed: AtomicBool,
}

impl<C: FeedConnector> SubscriptionManager<C> {
    pub fn new(connector: Arc<C>, cache: CurrencyCache, backoff: Backoff) -> Arc<Self> {
        Arc::new(Self {
            connector,
            cache,
            states: StateBoard::new(),
            counters: FeedCounters::default(),
            backoff,
            registry: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn cache(&self) -> &CurrencyCache {
        &self.cache
    }

    pub fn states(&self) -> &StateBoard {
        &self.states
    }

    pub fn counters(&self) -> &FeedCounters {
        &self.counters
    }

    pub fn state(&self, symbol: &str) -> Option<SubscriptionState> {
        self.states.get(symbol)
    }

    /// Number of subscriptions currently registered.
    pub fn active(&self) -> usize {
        self.registry.lock().len()
    }

    /// Start every symbol in `symbols`, ignoring repeats. Returns how many new
    /// subscriptions were started.
    pub fn subscribe_all<I, S>(self: &Arc<Self>, symbols: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();

        symbols
            .into_iter()
            .map(Into::into)
            .filter(|s| seen.insert(s.clone()))
            .filter(|s| self.subscribe(s))
            .count()
    }

    /// Claim `symbol` and spawn its supervised task.
    ///
    /// Returns `false` when the symbol is already claimed or already cached, or
    /// after shutdown. Claim and spawn happen under the registry lock, so two
    /// concurrent calls for one symbol start exactly one task and no task can
    /// slip in after `shutdown` has drained the registry.
    pub fn subscribe(self: &Arc<Self>, symbol: &str) -> bool {
        let mut registry = self.registry.lock();

        // `closed` only flips under the registry lock; see `shutdown`.
        if self.closed.load(Ordering::SeqCst) {
            debug!(symbol = %symbol, "manager shut down; subscription refused");
            return false;
        }

        if registry.contains_key(symbol) || self.cache.contains(symbol) {
            debug!(symbol = %symbol, "symbol already initialized");
            return false;
        }

        self.states.set(symbol, SubscriptionState::Handshaking);

        let (cancel, shutdown) = watch::channel(false);
        let span = tracing::info_span!("subscription", symbol = %symbol);
        let mm = Arc::clone(self);
        let owned = symbol.to_string();

        let task = tokio::spawn(async move { mm.supervise(owned, shutdown).await }.instrument(span));

        registry.insert(symbol.to_string(), SubscriptionHandle { cancel, task });
        info!(symbol = %symbol, "subscription started");
        true
    }

    /// Cancel every subscription and wait for each task to exit.
    pub async fn shutdown(&self) {
        let handles: Vec<(String, SubscriptionHandle)> = {
            let mut registry = self.registry.lock();
            self.closed.store(true, Ordering::SeqCst);
            registry.drain().collect()
        };
        info!(count = handles.len(), "stopping subscriptions");

        for (_, handle) in &handles {
            let _ = handle.cancel.send(true);
        }

        for (symbol, handle) in handles {
            if let Err(e) = handle.task.await {
                error!(symbol = %symbol, error = ?e, "subscription task panicked");
            }
        }
    }

    async fn supervise(self: Arc<Self>, symbol: String, mut shutdown: watch::Receiver<bool>) {
        let mut backoff = self.backoff.clone();

        loop {
            let started = Instant::now();

            let err = match self.run_once(&symbol, &mut shutdown).await {
                Ok(()) => break,
                Err(e) => e,
            };

            if started.elapsed() >= STABLE_SESSION {
                backoff.reset();
            }

            FeedCounters::incr(&self.counters.reconnects);
            let delay = backoff.next_delay();
            let attempt = backoff.attempt();

            warn!(
                error = %err,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "subscription failed; reconnecting"
            );
            self.states.set(
                &symbol,
                SubscriptionState::Reconnecting {
                    attempt,
                    last_error: err.to_string(),
                },
            );

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.states.set(&symbol, SubscriptionState::Stopped);
        info!("subscription stopped");
    }

    /// One connection lifetime. `Ok` means cancelled; the connection is always closed.
    async fn run_once(
        &self,
        symbol: &str,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), FeedError> {
        let mut conn = tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            res = self.connector.open() => res?,
        };

        let result = self.session(&mut conn, symbol, shutdown).await;
        conn.close().await;
        result
    }

    async fn session(
        &self,
        conn: &mut C::Connection,
        symbol: &str,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), FeedError> {
        // A reconnect keeps the cached identity; only a fresh symbol handshakes.
        if !self.cache.contains(symbol) {
            self.states.set(symbol, SubscriptionState::Handshaking);

            let hs = tokio::select! {
                biased;
                _ = shutdown.changed() => return Ok(()),
                res = handshake::resolve(conn, symbol) => res?,
            };

            if hs.is_empty() {
                return Err(FeedError::Unresolved(symbol.to_string()));
            }

            FeedCounters::incr(&self.counters.handshakes);
            if !hs.is_complete() {
                FeedCounters::incr(&self.counters.partial_handshakes);
                warn!(missing = ?hs.missing, "handshake incomplete; caching partial record");
            }

            self.cache.put(symbol, hs.record);
        }

        self.states.set(symbol, SubscriptionState::Streaming);
        info!("streaming ticker updates");

        ticker::stream(conn, symbol, &self.cache, &self.counters, shutdown).await
    }
}
