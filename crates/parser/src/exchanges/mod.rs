//! Per-venue schema matchers.
//!
//! Each venue is a unit struct implementing [`ExchangeParser`]. A venue
//! overrides the categories it understands; everything else falls through
//! to the provided methods, which report an unsupported combination.
//! [`dispatch!`] maps the closed [`Exchange`] enum onto these structs with
//! a plain `match`, so every call is statically dispatched.

pub(crate) mod binance;
pub(crate) mod bitmex;
pub(crate) mod bybit;
pub(crate) mod coinbase_pro;
pub(crate) mod deribit;
pub(crate) mod okx;

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde_json::Value;

use cmp_core::types::{
    BboMsg, Exchange, FundingRateMsg, KlineMsg, MarketType, MessageType, OpenInterestMsg,
    OrderBookMsg, TradeMsg,
};

use crate::error::{ParseError, Result};
use crate::fields::str_level;

/// Schema matchers of one venue.
///
/// `msg` is always the raw text as received; records echo it verbatim in
/// their `json` field.
pub(crate) trait ExchangeParser {
    const EXCHANGE: Exchange;

    /// Classify a message. Must not fail.
    fn msg_type(&self, msg: &str) -> MessageType;

    /// Venue symbol of the message, `ALL` when it carries several.
    fn extract_symbol(&self, market_type: MarketType, msg: &str) -> Result<String>;

    /// Largest event time in the message, `None` when it carries none.
    fn extract_timestamp(&self, market_type: MarketType, msg: &str) -> Result<Option<u64>>;

    fn parse_trade(&self, market_type: MarketType, _msg: &str) -> Result<Vec<TradeMsg>> {
        self.unsupported(market_type, MessageType::Trade)
    }

    fn parse_l2(
        &self,
        market_type: MarketType,
        _msg: &str,
        _received_at: Option<u64>,
    ) -> Result<Vec<OrderBookMsg>> {
        self.unsupported(market_type, MessageType::L2Event)
    }

    fn parse_l2_topk(
        &self,
        market_type: MarketType,
        _msg: &str,
        _received_at: Option<u64>,
    ) -> Result<Vec<OrderBookMsg>> {
        self.unsupported(market_type, MessageType::L2TopK)
    }

    fn parse_bbo(
        &self,
        market_type: MarketType,
        _msg: &str,
        _received_at: Option<u64>,
    ) -> Result<Vec<BboMsg>> {
        self.unsupported(market_type, MessageType::Bbo)
    }

    fn parse_candlestick(
        &self,
        market_type: MarketType,
        _msg: &str,
        _received_at: Option<u64>,
    ) -> Result<Vec<KlineMsg>> {
        self.unsupported(market_type, MessageType::Candlestick)
    }

    fn parse_funding_rate(
        &self,
        market_type: MarketType,
        _msg: &str,
        _received_at: Option<u64>,
    ) -> Result<Vec<FundingRateMsg>> {
        self.unsupported(market_type, MessageType::FundingRate)
    }

    fn parse_open_interest(
        &self,
        market_type: MarketType,
        _msg: &str,
        _received_at: Option<u64>,
    ) -> Result<Vec<OpenInterestMsg>> {
        self.unsupported(market_type, MessageType::OpenInterest)
    }

    fn unsupported<T>(&self, market_type: MarketType, msg_type: MessageType) -> Result<T> {
        Err(ParseError::unsupported(
            Self::EXCHANGE.as_str(),
            market_type,
            msg_type,
        ))
    }
}

/// Run `$body` with `$parser` bound to the venue's parser.
macro_rules! dispatch {
    ($exchange:expr, |$parser:ident| $body:expr) => {
        match $exchange {
            ::cmp_core::types::Exchange::Binance => {
                let $parser = $crate::exchanges::binance::BinanceParser;
                $body
            }
            ::cmp_core::types::Exchange::Bybit => {
                let $parser = $crate::exchanges::bybit::BybitParser;
                $body
            }
            ::cmp_core::types::Exchange::Okx => {
                let $parser = $crate::exchanges::okx::OkxParser;
                $body
            }
            ::cmp_core::types::Exchange::Deribit => {
                let $parser = $crate::exchanges::deribit::DeribitParser;
                $body
            }
            ::cmp_core::types::Exchange::Bitmex => {
                let $parser = $crate::exchanges::bitmex::BitmexParser;
                $body
            }
            ::cmp_core::types::Exchange::CoinbasePro => {
                let $parser = $crate::exchanges::coinbase_pro::CoinbaseProParser;
                $body
            }
        }
    };
}
pub(crate) use dispatch;

/// Symbol placeholder for messages that span several instruments.
pub(crate) const ALL_SYMBOLS: &str = "ALL";

/// Collapse the symbols found in one message into a single answer.
pub(crate) fn single_symbol<'a, I>(symbols: I) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let distinct: BTreeSet<&str> = symbols.into_iter().collect();
    let mut iter = distinct.into_iter();
    match (iter.next(), iter.next()) {
        (Some(only), None) => Ok(only.to_string()),
        (Some(_), Some(_)) => Ok(ALL_SYMBOLS.to_string()),
        (None, _) => Err(ParseError::malformed("message carries no symbol")),
    }
}

/// Deserialize a payload that is either one object or an array of them.
pub(crate) fn items<T: DeserializeOwned>(data: Value) -> Result<Vec<T>> {
    match data {
        Value::Array(arr) => arr
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(ParseError::from))
            .collect(),
        obj => Ok(vec![serde_json::from_value(obj)?]),
    }
}

/// Retype `[price, quantity]` string levels.
pub(crate) fn levels<L: AsRef<[String]>>(raw: &[L], field: &str) -> Result<Vec<(f64, f64)>> {
    raw.iter().map(|l| str_level(l.as_ref(), field)).collect()
}

/// Fail unless `market_type` is one of `allowed`.
pub(crate) fn require_market(
    exchange: Exchange,
    market_type: MarketType,
    msg_type: MessageType,
    allowed: &[MarketType],
) -> Result<()> {
    if allowed.contains(&market_type) {
        Ok(())
    } else {
        Err(ParseError::unsupported(exchange.as_str(), market_type, msg_type))
    }
}

pub(crate) const SPOT_AND_FUTURES: &[MarketType] = &[
    MarketType::Spot,
    MarketType::LinearFuture,
    MarketType::InverseFuture,
    MarketType::LinearSwap,
    MarketType::InverseSwap,
];

pub(crate) const FUTURES: &[MarketType] = &[
    MarketType::LinearFuture,
    MarketType::InverseFuture,
    MarketType::LinearSwap,
    MarketType::InverseSwap,
];

pub(crate) const SWAPS: &[MarketType] = &[MarketType::LinearSwap, MarketType::InverseSwap];
