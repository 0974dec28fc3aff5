//! # cmp-parser
//!
//! Normalizes raw exchange-native market data messages into the canonical
//! records of [`cmp_core::types`].
//!
//! Every entry point takes the lowercase exchange identifier, the market
//! type of the subscription and the raw message text. Parsing is pure: no
//! state is carried between calls apart from the read-only contract table.
//!
//! List operations treat an unsupported combination or a message that does
//! not match the expected schema as "nothing to extract" and return an empty
//! `Vec`. A missing contract specification is a hard error.

pub mod contract;
pub mod error;
mod exchanges;
mod fields;
mod normalize;
pub mod pair;

use cmp_core::logging::preview;
use cmp_core::types::{
    BboMsg, Exchange, FundingRateMsg, KlineMsg, MarketType, MessageType, OpenInterestMsg,
    OrderBookMsg, TradeMsg,
};
use tracing::{debug, warn};

use crate::exchanges::{dispatch, ExchangeParser};

pub use contract::{contract_value, ContractSpec, Settlement};
pub use error::{ParseError, Result};
pub use pair::normalize_pair;

fn exchange_of(exchange: &str, market_type: MarketType, msg_type: MessageType) -> Result<Exchange> {
    exchange
        .parse::<Exchange>()
        .map_err(|_| ParseError::unsupported(exchange, market_type, msg_type))
}

/// Map soft failures to an empty result.
fn soften<T>(
    exchange: &str,
    market_type: MarketType,
    msg_type: MessageType,
    msg: &str,
    result: Result<Vec<T>>,
) -> Result<Vec<T>> {
    match result {
        Ok(records) => Ok(records),
        Err(err) if err.is_soft() => {
            debug!(
                exchange,
                %market_type,
                %msg_type,
                error = %err,
                raw = preview(msg),
                "no records extracted"
            );
            Ok(Vec::new())
        }
        Err(err) => {
            warn!(exchange, %market_type, %msg_type, error = %err, "parse failed");
            Err(err)
        }
    }
}

/// Venue symbol of a message, `"ALL"` when it carries several instruments.
///
/// Returns `None` when the exchange is unknown or the message has no
/// recognizable symbol.
pub fn extract_symbol(exchange: &str, market_type: MarketType, msg: &str) -> Option<String> {
    let result = exchange_of(exchange, market_type, MessageType::Other)
        .and_then(|e| dispatch!(e, |p| p.extract_symbol(market_type, msg)));
    match result {
        Ok(symbol) => Some(symbol),
        Err(err) => {
            debug!(exchange, %market_type, error = %err, raw = preview(msg), "no symbol");
            None
        }
    }
}

/// Largest exchange event time in a message, in milliseconds.
///
/// Falls back to `received_at` when the message carries no event time, the
/// exchange is unknown or the message does not match any schema. A
/// timestamp field that is present but unparsable is an error.
pub fn extract_timestamp(
    exchange: &str,
    market_type: MarketType,
    msg: &str,
    received_at: Option<u64>,
) -> Result<Option<u64>> {
    let result = exchange_of(exchange, market_type, MessageType::Other)
        .and_then(|e| dispatch!(e, |p| p.extract_timestamp(market_type, msg)));
    match result {
        Ok(ts) => Ok(ts.or(received_at)),
        Err(err) if err.is_soft() => {
            debug!(exchange, %market_type, error = %err, raw = preview(msg), "no timestamp");
            Ok(received_at)
        }
        Err(err) => {
            warn!(exchange, %market_type, error = %err, "timestamp extraction failed");
            Err(err)
        }
    }
}

/// Classify a message. Unknown exchanges and unparsable input are
/// [`MessageType::Other`].
pub fn get_msg_type(exchange: &str, msg: &str) -> MessageType {
    match exchange.parse::<Exchange>() {
        Ok(e) => dispatch!(e, |p| p.msg_type(msg)),
        Err(_) => MessageType::Other,
    }
}

pub fn parse_trade(exchange: &str, market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>> {
    let msg_type = MessageType::Trade;
    let result = exchange_of(exchange, market_type, msg_type)
        .and_then(|e| dispatch!(e, |p| p.parse_trade(market_type, msg)));
    soften(exchange, market_type, msg_type, msg, result)
}

/// Incremental updates and full snapshots of the L2 book.
pub fn parse_l2(
    exchange: &str,
    market_type: MarketType,
    msg: &str,
    received_at: Option<u64>,
) -> Result<Vec<OrderBookMsg>> {
    let msg_type = MessageType::L2Event;
    let result = exchange_of(exchange, market_type, msg_type)
        .and_then(|e| dispatch!(e, |p| p.parse_l2(market_type, msg, received_at)));
    soften(exchange, market_type, msg_type, msg, result)
}

/// Top-K snapshots; every record has `snapshot = true`.
pub fn parse_l2_topk(
    exchange: &str,
    market_type: MarketType,
    msg: &str,
    received_at: Option<u64>,
) -> Result<Vec<OrderBookMsg>> {
    let msg_type = MessageType::L2TopK;
    let result = exchange_of(exchange, market_type, msg_type)
        .and_then(|e| dispatch!(e, |p| p.parse_l2_topk(market_type, msg, received_at)));
    soften(exchange, market_type, msg_type, msg, result)
}

pub fn parse_bbo(
    exchange: &str,
    market_type: MarketType,
    msg: &str,
    received_at: Option<u64>,
) -> Result<Vec<BboMsg>> {
    let msg_type = MessageType::Bbo;
    let result = exchange_of(exchange, market_type, msg_type)
        .and_then(|e| dispatch!(e, |p| p.parse_bbo(market_type, msg, received_at)));
    soften(exchange, market_type, msg_type, msg, result)
}

pub fn parse_candlestick(
    exchange: &str,
    market_type: MarketType,
    msg: &str,
    received_at: Option<u64>,
) -> Result<Vec<KlineMsg>> {
    let msg_type = MessageType::Candlestick;
    let result = exchange_of(exchange, market_type, msg_type)
        .and_then(|e| dispatch!(e, |p| p.parse_candlestick(market_type, msg, received_at)));
    soften(exchange, market_type, msg_type, msg, result)
}

pub fn parse_funding_rate(
    exchange: &str,
    market_type: MarketType,
    msg: &str,
    received_at: Option<u64>,
) -> Result<Vec<FundingRateMsg>> {
    let msg_type = MessageType::FundingRate;
    let result = exchange_of(exchange, market_type, msg_type)
        .and_then(|e| dispatch!(e, |p| p.parse_funding_rate(market_type, msg, received_at)));
    soften(exchange, market_type, msg_type, msg, result)
}

pub fn parse_open_interest(
    exchange: &str,
    market_type: MarketType,
    msg: &str,
    received_at: Option<u64>,
) -> Result<Vec<OpenInterestMsg>> {
    let msg_type = MessageType::OpenInterest;
    let result = exchange_of(exchange, market_type, msg_type)
        .and_then(|e| dispatch!(e, |p| p.parse_open_interest(market_type, msg, received_at)));
    soften(exchange, market_type, msg_type, msg, result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_exchange_is_soft() {
        assert!(parse_trade("mtgox", MarketType::Spot, "{}").unwrap().is_empty());
        assert_eq!(get_msg_type("mtgox", "{}"), MessageType::Other);
        assert_eq!(extract_symbol("mtgox", MarketType::Spot, "{}"), None);
        assert_eq!(extract_timestamp("mtgox", MarketType::Spot, "{}", Some(1)).unwrap(), Some(1));
    }

    #[test]
    fn test_extract_timestamp_soft_failures_fall_back() {
        let msg = r#"{"E":1}"#;
        assert_eq!(extract_timestamp("mtgox", MarketType::Spot, msg, Some(5)).unwrap(), Some(5));
        assert_eq!(extract_timestamp("mtgox", MarketType::Spot, msg, None).unwrap(), None);
        assert_eq!(
            extract_timestamp("binance", MarketType::Spot, "not json", Some(7)).unwrap(),
            Some(7)
        );
    }

    #[test]
    fn test_exchange_name_is_case_insensitive() {
        assert_eq!(get_msg_type("BINANCE", "not json"), MessageType::Other);
        let msg = r#"{"stream":"btcusdt@aggTrade","data":{"e":"aggTrade","E":1,"s":"BTCUSDT","a":1,"p":"1.0","q":"2.0","f":1,"l":1,"T":1,"m":true,"M":true}}"#;
        assert_eq!(get_msg_type("Binance", msg), MessageType::Trade);
    }

    #[test]
    fn test_soften_passes_hard_errors() {
        let hard: Result<Vec<()>> = Err(ParseError::UnknownContractSpec {
            exchange: Exchange::Okx,
            market_type: MarketType::LinearSwap,
            symbol: "PEPE-USDT-SWAP".into(),
        });
        assert!(soften("okx", MarketType::LinearSwap, MessageType::Trade, "{}", hard).is_err());
        let soft: Result<Vec<()>> = Err(ParseError::malformed("x"));
        assert!(soften("okx", MarketType::LinearSwap, MessageType::Trade, "{}", soft)
            .unwrap()
            .is_empty());
    }
}
