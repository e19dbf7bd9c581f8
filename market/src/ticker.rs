use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::cache::CurrencyCache;
use crate::counters::FeedCounters;
use crate::error::FeedError;
use crate::feed::FeedConnection;
use crate::feed::protocol::{FeedRequest, parse_ticker};

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Applied,
    /// Ack or keepalive: no ask price.
    Ignored,
    /// Symbol has no cached record; nothing written.
    UnknownSymbol,
    /// Could not be decoded; previous market data kept.
    Malformed,
    /// Upstream error object; the stream stays up.
    Rejected,
}

/// Apply one raw push to the cache. No frame content ends the stream; only
/// transport failures do.
pub fn apply_frame(
    raw: &str,
    symbol: &str,
    cache: &CurrencyCache,
    counters: &FeedCounters,
) -> FrameOutcome {
    let update = match parse_ticker(raw) {
        Ok(Some(update)) if update.has_data() => update,
        Ok(_) => {
            FeedCounters::incr(&counters.updates_ignored);
            return FrameOutcome::Ignored;
        }
        Err(FeedError::Rejected { code, message }) => {
            FeedCounters::incr(&counters.rejected);
            warn!(code, message = %message, "feed error object on ticker stream; ignored");
            return FrameOutcome::Rejected;
        }
        Err(e) => {
            FeedCounters::incr(&counters.parse_errors);
            warn!(error = %e, raw = %raw, "malformed ticker frame");
            return FrameOutcome::Malformed;
        }
    };

    if !cache.apply_ticker(symbol, &update) {
        FeedCounters::incr(&counters.unknown_symbol);
        warn!(symbol = %symbol, "ticker update for symbol without record; skipped");
        return FrameOutcome::UnknownSymbol;
    }

    FeedCounters::incr(&counters.updates_applied);
    debug!(ask = %update.ask, bid = %update.bid, last = %update.last, "ticker applied");
    FrameOutcome::Applied
}

/// Streaming loop for one symbol on an already handshaken connection.
///
/// A `subscribeTicker` frame precedes every read, as upstream expects. Returns
/// `Ok(())` once `shutdown` flips (or its sender is gone) and `Err` on any
/// transport failure.
#[instrument(skip(conn, cache, counters, shutdown), fields(symbol = %symbol))]
pub async fn stream<C>(
    conn: &mut C,
    symbol: &str,
    cache: &CurrencyCache,
    counters: &FeedCounters,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), FeedError>
where
    C: FeedConnection + ?Sized,
{
    let subscribe = FeedRequest::subscribe_ticker(symbol);

    loop {
        if *shutdown.borrow() {
            return Ok(());
        }

        let raw = tokio::select! {
            biased;
            _ = shutdown.changed() => return Ok(()),
            res = conn.request(&subscribe) => res?,
        };

        apply_frame(&raw, symbol, cache, counters);
    }
}
