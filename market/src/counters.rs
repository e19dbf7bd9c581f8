use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for feed visibility.
#[derive(Clone, Default)]
pub struct FeedCounters {
    pub handshakes: Arc<AtomicU64>,
    pub partial_handshakes: Arc<AtomicU64>,

    pub updates_applied: Arc<AtomicU64>,
    // empty-ask frames (acks, keepalives)
    pub updates_ignored: Arc<AtomicU64>,
    pub unknown_symbol: Arc<AtomicU64>,
    pub parse_errors: Arc<AtomicU64>,
    // upstream error objects on the ticker stream
    pub rejected: Arc<AtomicU64>,

    pub reconnects: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    pub handshakes: u64,
    pub partial_handshakes: u64,
    pub updates_applied: u64,
    pub updates_ignored: u64,
    pub unknown_symbol: u64,
    pub parse_errors: u64,
    pub rejected: u64,
    pub reconnects: u64,
}

impl FeedCounters {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);

        CountersSnapshot {
            handshakes: load(&self.handshakes),
            partial_handshakes: load(&self.partial_handshakes),
            updates_applied: load(&self.updates_applied),
            updates_ignored: load(&self.updates_ignored),
            unknown_symbol: load(&self.unknown_symbol),
            parse_errors: load(&self.parse_errors),
            rejected: load(&self.rejected),
            reconnects: load(&self.reconnects),
        }
    }
}
