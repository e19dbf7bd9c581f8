pub mod backoff;
pub mod cache;
pub mod counters;
pub mod error;
pub mod feed;
pub mod handshake;
pub mod manager;
pub mod ticker;
pub mod types;

pub use cache::CurrencyCache;
pub use error::FeedError;
pub use manager::SubscriptionManager;
pub use types::{CurrencyRecord, SubscriptionState, TickerUpdate};
