use cmp_core::types::{MessageType, TradeMsg, TradeSide};

use super::{Instrument, QuantityUnit};
use crate::error::{ParseError, Result};

/// How a venue tells which side was the aggressor.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SideCue {
    /// Binance `m`: the buyer was the maker, so the taker sold.
    BuyerIsMaker(bool),
    /// Side string naming the taker (`buy`, `Sell`, ...).
    Taker(String),
    /// Side string naming the resting order (Coinbase `match`).
    Maker(String),
}

impl SideCue {
    fn taker_side(&self) -> Result<TradeSide> {
        match self {
            SideCue::BuyerIsMaker(true) => Ok(TradeSide::Sell),
            SideCue::BuyerIsMaker(false) => Ok(TradeSide::Buy),
            SideCue::Taker(s) => parse_side(s),
            SideCue::Maker(s) => parse_side(s).map(TradeSide::flip),
        }
    }
}

fn parse_side(s: &str) -> Result<TradeSide> {
    if s.eq_ignore_ascii_case("buy") {
        Ok(TradeSide::Buy)
    } else if s.eq_ignore_ascii_case("sell") {
        Ok(TradeSide::Sell)
    } else {
        Err(ParseError::malformed(format!("unknown trade side '{s}'")))
    }
}

/// One venue trade before unit conversion.
#[derive(Debug, Clone)]
pub(crate) struct RawTrade {
    pub symbol: String,
    pub timestamp: u64,
    pub price: f64,
    pub quantity: f64,
    pub unit: QuantityUnit,
    pub side: SideCue,
    pub trade_id: Option<String>,
}

pub(crate) fn normalize(raw: RawTrade, inst: &Instrument, json: &str) -> Result<TradeMsg> {
    let q = inst.quantities(raw.price, raw.quantity, raw.unit)?;
    Ok(TradeMsg {
        exchange: inst.exchange,
        market_type: inst.market_type,
        msg_type: MessageType::Trade,
        symbol: raw.symbol,
        pair: inst.pair.clone(),
        timestamp: raw.timestamp,
        price: raw.price,
        quantity_base: q.base,
        quantity_quote: q.quote,
        quantity_contract: q.contract,
        side: raw.side.taker_side()?,
        trade_id: raw.trade_id,
        json: json.to_string(),
    })
}
