//! Feed wire format.
//!
//! Every message is a single JSON document in one websocket text frame.
//!
//! ```jsonc
//! // out
//! { "method": "getSymbol",       "params": { "symbol": "ETHBTC" } }
//! { "method": "getCurrency",     "params": { "currency": "ETH" } }
//! { "method": "subscribeTicker", "params": { "symbol": "ETHBTC" } }
//!
//! // in
//! { "result": { "baseCurrency": "ETH", "feeCurrency": "BTC" } }
//! { "result": { "id": "ETH", "fullName": "Ethereum" } }
//! { "result": true }                                   // subscribe ack
//! { "method": "ticker", "params": { "ask": "0.07", ... } }
//! { "error": { "code": 2001, "message": "Symbol not found" } }
//! ```
//!
//! Parsers are pure and stateless. A frame that is valid JSON but does not
//! carry the expected object yields `Ok(None)`; an upstream `error` object
//! yields `FeedError::Rejected`; anything else that fails to decode is
//! `FeedError::Parse`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;
use crate::types::TickerUpdate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum FeedRequest {
    GetSymbol { symbol: String },
    GetCurrency { currency: String },
    SubscribeTicker { symbol: String },
}

impl FeedRequest {
    pub fn get_symbol(symbol: &str) -> Self {
        Self::GetSymbol {
            symbol: symbol.to_string(),
        }
    }

    pub fn get_currency(currency: &str) -> Self {
        Self::GetCurrency {
            currency: currency.to_string(),
        }
    }

    pub fn subscribe_ticker(symbol: &str) -> Self {
        Self::SubscribeTicker {
            symbol: symbol.to_string(),
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::GetSymbol { .. } => "getSymbol",
            Self::GetCurrency { .. } => "getCurrency",
            Self::SubscribeTicker { .. } => "subscribeTicker",
        }
    }

    pub fn to_json(&self) -> Result<String, FeedError> {
        serde_json::to_string(self).map_err(FeedError::Encode)
    }
}

/// `result` of a `getSymbol` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    #[serde(default)]
    pub base_currency: String,
    #[serde(default)]
    pub fee_currency: String,
}

/// `result` of a `getCurrency` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultEnvelope<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct PushEnvelope {
    params: Option<TickerUpdate>,
    error: Option<RpcError>,
}

fn parse_result<T: DeserializeOwned>(raw: &str) -> Result<Option<T>, FeedError> {
    let env: ResultEnvelope<T> = serde_json::from_str(raw)?;

    if let Some(err) = env.error {
        return Err(FeedError::Rejected {
            code: err.code,
            message: err.message,
        });
    }

    Ok(env.result)
}

pub fn parse_symbol_reply(raw: &str) -> Result<Option<SymbolInfo>, FeedError> {
    parse_result(raw)
}

pub fn parse_currency_reply(raw: &str) -> Result<Option<CurrencyInfo>, FeedError> {
    parse_result(raw)
}

/// Extract market fields from a push. Acks such as `{"result":true}` have no
/// `params` and return `None`.
pub fn parse_ticker(raw: &str) -> Result<Option<TickerUpdate>, FeedError> {
    let env: PushEnvelope = serde_json::from_str(raw)?;

    if let Some(err) = env.error {
        return Err(FeedError::Rejected {
            code: err.code,
            message: err.message,
        });
    }

    Ok(env.params)
}
