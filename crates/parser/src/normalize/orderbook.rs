use cmp_core::types::{MessageType, Order, OrderBookMsg};

use super::{Instrument, QuantityUnit};
use crate::error::{ParseError, Result};
use crate::fields::event_time_or;

/// One venue book message before unit conversion.
///
/// Levels are `(price, quantity)` in venue order.
#[derive(Debug, Clone)]
pub(crate) struct RawOrderBook {
    pub symbol: String,
    pub timestamp: Option<u64>,
    pub asks: Vec<(f64, f64)>,
    pub bids: Vec<(f64, f64)>,
    pub unit: QuantityUnit,
    pub snapshot: bool,
    pub seq_id: Option<u64>,
    pub prev_seq_id: Option<u64>,
}

/// Incremental or full-depth book.
pub(crate) fn normalize_l2(
    raw: RawOrderBook,
    inst: &Instrument,
    received_at: Option<u64>,
    json: &str,
) -> Result<OrderBookMsg> {
    let msg_type = if raw.snapshot {
        MessageType::L2Snapshot
    } else {
        MessageType::L2Event
    };
    build(raw, inst, msg_type, received_at, json)
}

/// Top-K snapshot: always a snapshot, at most `depth` levels per side.
pub(crate) fn normalize_topk(
    mut raw: RawOrderBook,
    depth: usize,
    inst: &Instrument,
    received_at: Option<u64>,
    json: &str,
) -> Result<OrderBookMsg> {
    raw.snapshot = true;
    raw.asks.truncate(depth);
    raw.bids.truncate(depth);
    build(raw, inst, MessageType::L2TopK, received_at, json)
}

fn build(
    raw: RawOrderBook,
    inst: &Instrument,
    msg_type: MessageType,
    received_at: Option<u64>,
    json: &str,
) -> Result<OrderBookMsg> {
    if raw.asks.is_empty() && raw.bids.is_empty() {
        return Err(ParseError::malformed("order book has no levels"));
    }
    let orders = |levels: Vec<(f64, f64)>| -> Result<Vec<Order>> {
        levels
            .into_iter()
            .map(|(price, qty)| {
                let q = inst.quantities(price, qty, raw.unit)?;
                Ok(Order {
                    price,
                    quantity_base: q.base,
                    quantity_quote: q.quote,
                    quantity_contract: q.contract,
                })
            })
            .collect()
    };
    Ok(OrderBookMsg {
        exchange: inst.exchange,
        market_type: inst.market_type,
        msg_type,
        timestamp: event_time_or(raw.timestamp, received_at)?,
        asks: orders(raw.asks)?,
        bids: orders(raw.bids)?,
        symbol: raw.symbol,
        pair: inst.pair.clone(),
        seq_id: raw.seq_id,
        prev_seq_id: raw.prev_seq_id,
        snapshot: raw.snapshot,
        json: json.to_string(),
    })
}
