use cmp_core::types::{FundingRateMsg, MessageType};

use super::Instrument;
use crate::error::Result;
use crate::fields::event_time_or;

#[derive(Debug, Clone)]
pub(crate) struct RawFundingRate {
    pub symbol: String,
    pub timestamp: Option<u64>,
    pub funding_rate: f64,
    pub funding_time: u64,
    pub estimated_rate: Option<f64>,
}

pub(crate) fn normalize(
    raw: RawFundingRate,
    inst: &Instrument,
    received_at: Option<u64>,
    json: &str,
) -> Result<FundingRateMsg> {
    Ok(FundingRateMsg {
        exchange: inst.exchange,
        market_type: inst.market_type,
        msg_type: MessageType::FundingRate,
        symbol: raw.symbol,
        pair: inst.pair.clone(),
        timestamp: event_time_or(raw.timestamp, received_at)?,
        funding_rate: raw.funding_rate,
        funding_time: raw.funding_time,
        estimated_rate: raw.estimated_rate,
        json: json.to_string(),
    })
}
