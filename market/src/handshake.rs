//! Two-step metadata resolution run once per symbol before streaming.
//!
//! `getSymbol` yields the base and fee currencies, `getCurrency` on the base
//! currency yields its canonical id and display name. Transport failures abort
//! the handshake; a reply that is malformed or rejected by upstream only leaves
//! the affected fields empty and is reported through `Handshake::missing`.

use tracing::{debug, instrument, warn};

use crate::error::FeedError;
use crate::feed::FeedConnection;
use crate::feed::protocol::{FeedRequest, parse_currency_reply, parse_symbol_reply};
use crate::types::CurrencyRecord;

/// Identity fields a handshake resolves, by wire name.
pub const IDENTITY_FIELDS: [&str; 3] = ["id", "fullName", "feeCurrency"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub record: CurrencyRecord,
    /// Identity fields that could not be resolved, by wire name.
    pub missing: Vec<&'static str>,
}

impl Handshake {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Nothing at all came back; such a record is not worth caching.
    pub fn is_empty(&self) -> bool {
        self.missing.len() == IDENTITY_FIELDS.len()
    }
}

fn is_transport(e: &FeedError) -> bool {
    !matches!(e, FeedError::Parse(_) | FeedError::Rejected { .. })
}

#[instrument(skip(conn), fields(symbol = %symbol))]
pub async fn resolve<C>(conn: &mut C, symbol: &str) -> Result<Handshake, FeedError>
where
    C: FeedConnection + ?Sized,
{
    let mut missing = Vec::new();

    let raw = conn.request(&FeedRequest::get_symbol(symbol)).await?;
    let symbol_info = match parse_symbol_reply(&raw) {
        Ok(info) => info.unwrap_or_default(),
        Err(e) if is_transport(&e) => return Err(e),
        Err(e) => {
            warn!(error = %e, raw = %raw, "unusable getSymbol reply");
            Default::default()
        }
    };

    if symbol_info.fee_currency.is_empty() {
        missing.push("feeCurrency");
    }

    let mut record = CurrencyRecord {
        fee_currency: symbol_info.fee_currency,
        ..CurrencyRecord::default()
    };

    if symbol_info.base_currency.is_empty() {
        // No base currency to look up.
        missing.extend(["id", "fullName"]);
        return Ok(Handshake { record, missing });
    }

    let raw = conn
        .request(&FeedRequest::get_currency(&symbol_info.base_currency))
        .await?;
    let currency_info = match parse_currency_reply(&raw) {
        Ok(info) => info.unwrap_or_default(),
        Err(e) if is_transport(&e) => return Err(e),
        Err(e) => {
            warn!(error = %e, raw = %raw, "unusable getCurrency reply");
            Default::default()
        }
    };

    if currency_info.id.is_empty() {
        missing.push("id");
    }
    if currency_info.full_name.is_empty() {
        missing.push("fullName");
    }

    record.id = currency_info.id;
    record.full_name = currency_info.full_name;

    debug!(id = %record.id, full_name = %record.full_name, fee = %record.fee_currency, "handshake resolved");

    Ok(Handshake { record, missing })
}
