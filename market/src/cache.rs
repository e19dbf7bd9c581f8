use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::types::{CurrencyRecord, TickerUpdate};

/// In-memory store of the latest record per tracked symbol.
///
/// Guarantees:
/// - Every operation runs under one whole-map lock, so no call observes a torn record.
/// - Callers only ever receive copies; the map itself never leaves the lock.
/// - Entries are never evicted; size is bounded by the configured symbol set.
#[derive(Clone, Default)]
pub struct CurrencyCache {
    inner: Arc<Mutex<HashMap<String, CurrencyRecord>>>,
}

impl CurrencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `symbol`. Last write wins.
    pub fn put(&self, symbol: &str, record: CurrencyRecord) {
        self.inner.lock().insert(symbol.to_string(), record);
    }

    /// Returns a copy of the record if the handshake for `symbol` has completed.
    pub fn get(&self, symbol: &str) -> Option<CurrencyRecord> {
        self.inner.lock().get(symbol).cloned()
    }

    /// Deep-copied snapshot of every record. Later writes never show through.
    pub fn get_all(&self) -> HashMap<String, CurrencyRecord> {
        self.inner.lock().clone()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.inner.lock().contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Overwrite the market fields of an existing record in one critical section.
    ///
    /// Returns `false` and leaves the cache untouched when `symbol` has no record:
    /// identity fields would be missing, so no record is created here.
    #[instrument(skip(self, update), target = "cache", level = "trace")]
    pub fn apply_ticker(&self, symbol: &str, update: &TickerUpdate) -> bool {
        let mut map = self.inner.lock();

        match map.get_mut(symbol) {
            Some(record) => {
                record.apply(update);
                true
            }
            None => {
                debug!("ticker update for uncached symbol dropped");
                false
            }
        }
    }
}
