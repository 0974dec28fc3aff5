use cmp_core::types::{MessageType, OpenInterestMsg, OpenInterestUnit};

use super::Instrument;
use crate::error::{ParseError, Result};
use crate::fields::event_time_or;

#[derive(Debug, Clone)]
pub(crate) struct RawOpenInterest {
    pub symbol: String,
    pub timestamp: Option<u64>,
    pub open_interest: f64,
    pub unit: OpenInterestUnit,
}

pub(crate) fn normalize(
    raw: RawOpenInterest,
    inst: &Instrument,
    received_at: Option<u64>,
    json: &str,
) -> Result<OpenInterestMsg> {
    if !(raw.open_interest.is_finite() && raw.open_interest >= 0.0) {
        return Err(ParseError::malformed(format!(
            "invalid open interest {}",
            raw.open_interest
        )));
    }
    Ok(OpenInterestMsg {
        exchange: inst.exchange,
        market_type: inst.market_type,
        msg_type: MessageType::OpenInterest,
        symbol: raw.symbol,
        pair: inst.pair.clone(),
        timestamp: event_time_or(raw.timestamp, received_at)?,
        open_interest: raw.open_interest,
        unit: raw.unit,
        json: json.to_string(),
    })
}
