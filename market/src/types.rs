use serde::{Deserialize, Serialize};

/// Cached view of one tracked symbol.
///
/// Identity fields (`id`, `full_name`, `fee_currency`) come from the handshake;
/// market fields stay empty until the first ticker update. Prices are kept as
/// the decimal text the feed sends, never parsed into floats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRecord {
    pub id: String,
    pub full_name: String,
    pub fee_currency: String,

    pub ask: String,
    pub bid: String,
    pub last: String,
    pub open: String,
    pub low: String,
    pub high: String,
}

impl CurrencyRecord {
    /// Record produced by a completed handshake, market fields empty.
    pub fn identity(
        id: impl Into<String>,
        full_name: impl Into<String>,
        fee_currency: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            fee_currency: fee_currency.into(),
            ..Self::default()
        }
    }

    /// Overwrite all six market fields. Identity fields are untouched.
    pub fn apply(&mut self, update: &TickerUpdate) {
        self.ask.clone_from(&update.ask);
        self.bid.clone_from(&update.bid);
        self.last.clone_from(&update.last);
        self.open.clone_from(&update.open);
        self.low.clone_from(&update.low);
        self.high.clone_from(&update.high);
    }
}

/// Market fields carried by a `ticker` push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TickerUpdate {
    #[serde(default)]
    pub ask: String,
    #[serde(default)]
    pub bid: String,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub open: String,
    #[serde(default)]
    pub low: String,
    #[serde(default)]
    pub high: String,
}

impl TickerUpdate {
    /// Frames without an ask price are acks or keepalives, not market data.
    pub fn has_data(&self) -> bool {
        !self.ask.is_empty()
    }
}

/// Lifecycle of one symbol's subscription as seen by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubscriptionState {
    Handshaking,
    Streaming,
    Reconnecting { attempt: u32, last_error: String },
    Stopped,
}

impl SubscriptionState {
    pub fn is_streaming(&self) -> bool {
        matches!(self, SubscriptionState::Streaming)
    }
}
