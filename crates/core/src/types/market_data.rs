//! Canonical market data records shared by every exchange parser.
//!
//! These types are the output format of the engine. Exchange-specific
//! matchers produce intermediate records that the category normalizers turn
//! into these structures; every field is populated before a record is
//! returned.

use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::exchange::{Exchange, TradeSide};
use super::market::{MarketType, MessageType};

/// A single trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeMsg {
    pub exchange: Exchange,
    pub market_type: MarketType,
    pub msg_type: MessageType,
    /// Venue-native symbol, verbatim.
    pub symbol: String,
    /// Normalized `BASE/QUOTE` pair.
    pub pair: String,
    /// Exchange trade time in milliseconds.
    pub timestamp: u64,
    pub price: f64,
    pub quantity_base: f64,
    pub quantity_quote: f64,
    /// Number of contracts; `None` for spot markets.
    pub quantity_contract: Option<f64>,
    /// Taker side.
    pub side: TradeSide,
    /// Venue trade identifier, when the venue assigns one.
    pub trade_id: Option<String>,
    /// The raw message this record was extracted from.
    pub json: String,
}

/// One price level: price plus the quantity in all three units.
///
/// Serialized as a compact array `[price, quantity_base, quantity_quote]`,
/// followed by `quantity_contract` when the market is contract-denominated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    pub price: f64,
    pub quantity_base: f64,
    pub quantity_quote: f64,
    pub quantity_contract: Option<f64>,
}

impl Serialize for Order {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.quantity_contract.is_some() { 4 } else { 3 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.price)?;
        seq.serialize_element(&self.quantity_base)?;
        seq.serialize_element(&self.quantity_quote)?;
        if let Some(contract) = self.quantity_contract {
            seq.serialize_element(&contract)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Order {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderVisitor;

        impl<'de> Visitor<'de> for OrderVisitor {
            type Value = Order;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an array of 3 or 4 numbers")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Order, A::Error> {
                let price = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let quantity_base = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let quantity_quote = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(2, &self))?;
                let quantity_contract = seq.next_element()?;
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(5, &self));
                }
                Ok(Order {
                    price,
                    quantity_base,
                    quantity_quote,
                    quantity_contract,
                })
            }
        }

        deserializer.deserialize_seq(OrderVisitor)
    }
}

/// L2 order book update, full snapshot, or top-K snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookMsg {
    pub exchange: Exchange,
    pub market_type: MarketType,
    /// `l2_event` for depth feeds, `l2_topk` for top-K snapshots.
    pub msg_type: MessageType,
    pub symbol: String,
    pub pair: String,
    pub timestamp: u64,
    /// Venue sequence number of this update.
    pub seq_id: Option<u64>,
    /// Sequence number of the update this one chains to.
    pub prev_seq_id: Option<u64>,
    /// Asks in venue order.
    pub asks: Vec<Order>,
    /// Bids in venue order.
    pub bids: Vec<Order>,
    /// `true` for a full snapshot, `false` for an incremental diff.
    pub snapshot: bool,
    pub json: String,
}

/// Best bid and offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BboMsg {
    pub exchange: Exchange,
    pub market_type: MarketType,
    pub msg_type: MessageType,
    pub symbol: String,
    pub pair: String,
    pub timestamp: u64,
    pub ask_price: f64,
    pub ask_quantity_base: f64,
    pub ask_quantity_quote: f64,
    pub ask_quantity_contract: Option<f64>,
    pub bid_price: f64,
    pub bid_quantity_base: f64,
    pub bid_quantity_quote: f64,
    pub bid_quantity_contract: Option<f64>,
    /// Venue update id, when the feed carries one.
    pub id: Option<u64>,
    pub json: String,
}

/// Candlestick (kline) bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlineMsg {
    pub exchange: Exchange,
    pub market_type: MarketType,
    pub msg_type: MessageType,
    pub symbol: String,
    pub pair: String,
    /// Message time in milliseconds.
    pub timestamp: u64,
    /// Canonical period code, e.g. `1m`, `4h`, `1d`.
    pub period: String,
    /// Bar open time in **seconds** since the epoch.
    pub begin_time: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Traded volume in base currency.
    pub volume: f64,
    /// Traded volume in quote currency, when the venue reports it.
    pub quote_volume: Option<f64>,
    pub json: String,
}

/// Perpetual swap funding rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRateMsg {
    pub exchange: Exchange,
    pub market_type: MarketType,
    pub msg_type: MessageType,
    pub symbol: String,
    pub pair: String,
    pub timestamp: u64,
    /// Fractional rate, e.g. `0.0001` for 1 bp.
    pub funding_rate: f64,
    /// Settlement time of this rate in milliseconds.
    pub funding_time: u64,
    /// Predicted rate for the following period, when published.
    pub estimated_rate: Option<f64>,
    pub json: String,
}

/// Unit an open interest figure is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenInterestUnit {
    Contract,
    Base,
    Quote,
}

/// Open interest of one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestMsg {
    pub exchange: Exchange,
    pub market_type: MarketType,
    pub msg_type: MessageType,
    pub symbol: String,
    pub pair: String,
    pub timestamp: u64,
    pub open_interest: f64,
    pub unit: OpenInterestUnit,
    pub json: String,
}
