//! Coinbase Pro spot matchers.

pub mod types;

use cmp_core::types::{BboMsg, Exchange, MarketType, MessageType, OrderBookMsg, TradeMsg};
use serde::de::DeserializeOwned;
use serde_json::Value;

use self::types::{CoinbaseHeader, CoinbaseL2Update, CoinbaseMatch, CoinbaseSnapshot, CoinbaseTicker};
use super::{levels, require_market, ExchangeParser};
use crate::error::{ParseError, Result};
use crate::fields::{iso_millis, str_f64};
use crate::normalize::{self, QuantityUnit, RawBbo, RawOrderBook, RawTrade, SideCue};

pub(crate) struct CoinbaseProParser;

const MARKETS: &[MarketType] = &[MarketType::Spot];

fn kind_type(kind: &str) -> MessageType {
    match kind {
        "match" | "last_match" => MessageType::Trade,
        "snapshot" => MessageType::L2Snapshot,
        "l2update" => MessageType::L2Event,
        "ticker" => MessageType::Ticker,
        _ => MessageType::Other,
    }
}

/// Deserialize `msg` as `T` after checking its `type` tag.
fn parse_typed<T: DeserializeOwned>(msg: &str, expected: &[MessageType]) -> Result<(String, T)> {
    let value: Value = serde_json::from_str(msg)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::malformed("message has no type"))?
        .to_string();
    if !expected.contains(&kind_type(&kind)) {
        return Err(ParseError::malformed(format!("unexpected message type {kind}")));
    }
    Ok((kind, serde_json::from_value(value)?))
}

fn best_size(size: Option<&str>, field: &str) -> Result<f64> {
    let size = size.ok_or_else(|| ParseError::malformed(format!("{field} is missing")))?;
    str_f64(size, field)
}

impl ExchangeParser for CoinbaseProParser {
    const EXCHANGE: Exchange = Exchange::CoinbasePro;

    fn msg_type(&self, msg: &str) -> MessageType {
        serde_json::from_str::<CoinbaseHeader>(msg)
            .map_or(MessageType::Other, |h| kind_type(&h.kind))
    }

    fn extract_symbol(&self, _market_type: MarketType, msg: &str) -> Result<String> {
        let header: CoinbaseHeader = serde_json::from_str(msg)?;
        header
            .product_id
            .ok_or_else(|| ParseError::malformed("message has no product_id"))
    }

    fn extract_timestamp(&self, _market_type: MarketType, msg: &str) -> Result<Option<u64>> {
        let header: CoinbaseHeader = serde_json::from_str(msg)?;
        header.time.as_deref().map(iso_millis).transpose()
    }

    fn parse_trade(&self, market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Trade, MARKETS)?;
        let (_, m): (_, CoinbaseMatch) = parse_typed(msg, &[MessageType::Trade])?;
        let raw = RawTrade {
            timestamp: iso_millis(&m.time)?,
            price: str_f64(&m.price, "price")?,
            quantity: str_f64(&m.size, "size")?,
            unit: QuantityUnit::Base,
            side: SideCue::Maker(m.side),
            trade_id: Some(m.trade_id.to_string()),
            symbol: m.product_id,
        };
        normalize::trades(Self::EXCHANGE, market_type, vec![raw], msg)
    }

    fn parse_l2(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OrderBookMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::L2Event, MARKETS)?;
        let (kind, value): (_, Value) =
            parse_typed(msg, &[MessageType::L2Snapshot, MessageType::L2Event])?;
        let raw = if kind == "snapshot" {
            let s: CoinbaseSnapshot = serde_json::from_value(value)?;
            RawOrderBook {
                timestamp: None,
                asks: levels(&s.asks, "asks")?,
                bids: levels(&s.bids, "bids")?,
                unit: QuantityUnit::Base,
                snapshot: true,
                seq_id: None,
                prev_seq_id: None,
                symbol: s.product_id,
            }
        } else {
            let u: CoinbaseL2Update = serde_json::from_value(value)?;
            let mut asks = Vec::new();
            let mut bids = Vec::new();
            for [side, price, size] in &u.changes {
                let level = (str_f64(price, "changes")?, str_f64(size, "changes")?);
                match side.as_str() {
                    "buy" => bids.push(level),
                    "sell" => asks.push(level),
                    other => {
                        return Err(ParseError::malformed(format!("unknown change side '{other}'")));
                    }
                }
            }
            RawOrderBook {
                timestamp: Some(iso_millis(&u.time)?),
                asks,
                bids,
                unit: QuantityUnit::Base,
                snapshot: false,
                seq_id: None,
                prev_seq_id: None,
                symbol: u.product_id,
            }
        };
        normalize::l2_books(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }

    fn parse_bbo(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<BboMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Bbo, MARKETS)?;
        let (_, t): (_, CoinbaseTicker) = parse_typed(msg, &[MessageType::Ticker])?;
        let raw = RawBbo {
            timestamp: t.time.as_deref().map(iso_millis).transpose()?,
            ask: (
                str_f64(&t.best_ask, "best_ask")?,
                best_size(t.best_ask_size.as_deref(), "best_ask_size")?,
            ),
            bid: (
                str_f64(&t.best_bid, "best_bid")?,
                best_size(t.best_bid_size.as_deref(), "best_bid_size")?,
            ),
            unit: QuantityUnit::Base,
            id: t.sequence,
            symbol: t.product_id,
        };
        normalize::bbos(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }
}
