use cmp_core::types::{BboMsg, MessageType};

use super::{Instrument, Quantities, QuantityUnit};
use crate::error::Result;
use crate::fields::event_time_or;

/// Best bid and offer before unit conversion.
#[derive(Debug, Clone)]
pub(crate) struct RawBbo {
    pub symbol: String,
    pub timestamp: Option<u64>,
    pub ask: (f64, f64),
    pub bid: (f64, f64),
    pub unit: QuantityUnit,
    pub id: Option<u64>,
}

/// Convert one side; a zero price means the side is empty and becomes a
/// zero-quantity level.
fn side_quantities(
    inst: &Instrument,
    (price, quantity): (f64, f64),
    unit: QuantityUnit,
) -> Result<Quantities> {
    if price == 0.0 {
        return Ok(Quantities {
            base: 0.0,
            quote: 0.0,
            contract: inst.spec.map(|_| 0.0),
        });
    }
    inst.quantities(price, quantity, unit)
}

pub(crate) fn normalize(
    raw: RawBbo,
    inst: &Instrument,
    received_at: Option<u64>,
    json: &str,
) -> Result<BboMsg> {
    let ask = side_quantities(inst, raw.ask, raw.unit)?;
    let bid = side_quantities(inst, raw.bid, raw.unit)?;
    Ok(BboMsg {
        exchange: inst.exchange,
        market_type: inst.market_type,
        msg_type: MessageType::Bbo,
        symbol: raw.symbol,
        pair: inst.pair.clone(),
        timestamp: event_time_or(raw.timestamp, received_at)?,
        ask_price: raw.ask.0,
        ask_quantity_base: ask.base,
        ask_quantity_quote: ask.quote,
        ask_quantity_contract: ask.contract,
        bid_price: raw.bid.0,
        bid_quantity_base: bid.base,
        bid_quantity_quote: bid.quote,
        bid_quantity_contract: bid.contract,
        id: raw.id,
        json: json.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmp_core::types::{Exchange, MarketType};

    fn raw(bid: (f64, f64), ask: (f64, f64)) -> RawBbo {
        RawBbo {
            symbol: "BTC-PERPETUAL".into(),
            timestamp: Some(1),
            ask,
            bid,
            unit: QuantityUnit::Quote,
            id: None,
        }
    }

    #[test]
    fn test_empty_side_is_zero_level() {
        let inst =
            Instrument::resolve(Exchange::Deribit, MarketType::InverseSwap, "BTC-PERPETUAL", true)
                .unwrap();
        let bbo = normalize(raw((0.0, 0.0), (50000.0, 100.0)), &inst, None, "{}").unwrap();
        assert_eq!(bbo.bid_price, 0.0);
        assert_eq!(bbo.bid_quantity_base, 0.0);
        assert_eq!(bbo.bid_quantity_quote, 0.0);
        assert_eq!(bbo.bid_quantity_contract, Some(0.0));
        assert_eq!(bbo.ask_quantity_contract, Some(10.0));
    }

    #[test]
    fn test_negative_price_is_still_rejected() {
        let inst =
            Instrument::resolve(Exchange::Deribit, MarketType::InverseSwap, "BTC-PERPETUAL", true)
                .unwrap();
        assert!(normalize(raw((-1.0, 1.0), (50000.0, 100.0)), &inst, None, "{}").is_err());
    }
}
