//! Category normalizers.
//!
//! Exchange matchers produce the venue-neutral intermediate records defined
//! in the submodules (`RawTrade`, `RawOrderBook`, ...). The normalizers
//! here resolve the instrument (pair and contract spec), convert quantities
//! into base / quote / contract units, and build the canonical records.
//!
//! Conversion rules, with `size` the contract size:
//!
//! | venue unit | linear / quanto | inverse |
//! |------------|-----------------|---------|
//! | contracts  | base = n × size, quote = base × price | quote = n × size, base = quote / price |
//! | base       | quote = base × price, contracts = base / size | quote = base × price, contracts = quote / size |
//! | quote      | base = quote / price, contracts = base / size | base = quote / price, contracts = quote / size |
//!
//! A quanto `size` is the multiplier in the settlement currency, so for
//! quanto contracts `quote` is the position value in that currency
//! (`n × multiplier × price`).

pub(crate) mod bbo;
pub(crate) mod funding_rate;
pub(crate) mod kline;
pub(crate) mod open_interest;
pub(crate) mod orderbook;
pub(crate) mod trade;

use cmp_core::types::{
    BboMsg, Exchange, FundingRateMsg, KlineMsg, MarketType, OpenInterestMsg, OrderBookMsg,
    TradeMsg,
};

use crate::contract::{contract_value, ContractSpec, Settlement};
use crate::error::{ParseError, Result};
use crate::pair::normalize_pair;

pub(crate) use bbo::RawBbo;
pub(crate) use funding_rate::RawFundingRate;
pub(crate) use kline::RawKline;
pub(crate) use open_interest::RawOpenInterest;
pub(crate) use orderbook::RawOrderBook;
pub(crate) use trade::{RawTrade, SideCue};

/// Unit a venue reports a quantity in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuantityUnit {
    Contracts,
    Base,
    Quote,
}

/// A quantity expressed in all three units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Quantities {
    pub base: f64,
    pub quote: f64,
    pub contract: Option<f64>,
}

/// Resolved facts about the instrument a record belongs to.
#[derive(Debug, Clone)]
pub(crate) struct Instrument {
    pub exchange: Exchange,
    pub market_type: MarketType,
    pub pair: String,
    /// `None` for markets that are not contract-denominated.
    pub spec: Option<ContractSpec>,
}

impl Instrument {
    /// Resolve pair and, for quantity-bearing categories on derivative
    /// markets, the contract spec.
    pub fn resolve(
        exchange: Exchange,
        market_type: MarketType,
        symbol: &str,
        with_contract: bool,
    ) -> Result<Self> {
        let pair = normalize_pair(exchange, market_type, symbol).ok_or_else(|| {
            ParseError::malformed(format!("cannot derive a pair from symbol '{symbol}'"))
        })?;
        let spec = if with_contract && market_type.is_derivative() {
            Some(contract_value(exchange, market_type, symbol)?)
        } else {
            None
        };
        Ok(Self {
            exchange,
            market_type,
            pair,
            spec,
        })
    }

    /// Convert a venue quantity at `price` into all three units.
    pub fn quantities(&self, price: f64, quantity: f64, unit: QuantityUnit) -> Result<Quantities> {
        if !(price.is_finite() && price > 0.0) {
            return Err(ParseError::malformed(format!("invalid price {price}")));
        }
        if !(quantity.is_finite() && quantity >= 0.0) {
            return Err(ParseError::malformed(format!("invalid quantity {quantity}")));
        }

        let Some(spec) = self.spec else {
            return Ok(match unit {
                QuantityUnit::Quote => Quantities {
                    base: quantity / price,
                    quote: quantity,
                    contract: None,
                },
                QuantityUnit::Base | QuantityUnit::Contracts => Quantities {
                    base: quantity,
                    quote: price * quantity,
                    contract: None,
                },
            });
        };

        let (base, quote) = match (unit, spec.settlement) {
            (QuantityUnit::Contracts, Settlement::Linear | Settlement::Quanto) => {
                let base = quantity * spec.size;
                (base, price * base)
            }
            (QuantityUnit::Contracts, Settlement::Inverse) => {
                let quote = quantity * spec.size;
                (quote / price, quote)
            }
            (QuantityUnit::Base, _) => (quantity, price * quantity),
            (QuantityUnit::Quote, _) => (quantity / price, quantity),
        };
        let contract = match unit {
            QuantityUnit::Contracts => quantity,
            _ if spec.is_inverse() => quote / spec.size,
            _ => base / spec.size,
        };
        Ok(Quantities {
            base,
            quote,
            contract: Some(contract),
        })
    }
}

pub(crate) fn trades(
    exchange: Exchange,
    market_type: MarketType,
    raws: Vec<RawTrade>,
    json: &str,
) -> Result<Vec<TradeMsg>> {
    raws.into_iter()
        .map(|raw| {
            let inst = Instrument::resolve(exchange, market_type, &raw.symbol, true)?;
            trade::normalize(raw, &inst, json)
        })
        .collect()
}

pub(crate) fn l2_books(
    exchange: Exchange,
    market_type: MarketType,
    raws: Vec<RawOrderBook>,
    received_at: Option<u64>,
    json: &str,
) -> Result<Vec<OrderBookMsg>> {
    raws.into_iter()
        .map(|raw| {
            let inst = Instrument::resolve(exchange, market_type, &raw.symbol, true)?;
            orderbook::normalize_l2(raw, &inst, received_at, json)
        })
        .collect()
}

pub(crate) fn topk_books(
    exchange: Exchange,
    market_type: MarketType,
    raws: Vec<RawOrderBook>,
    depth: usize,
    received_at: Option<u64>,
    json: &str,
) -> Result<Vec<OrderBookMsg>> {
    raws.into_iter()
        .map(|raw| {
            let inst = Instrument::resolve(exchange, market_type, &raw.symbol, true)?;
            orderbook::normalize_topk(raw, depth, &inst, received_at, json)
        })
        .collect()
}

pub(crate) fn bbos(
    exchange: Exchange,
    market_type: MarketType,
    raws: Vec<RawBbo>,
    received_at: Option<u64>,
    json: &str,
) -> Result<Vec<BboMsg>> {
    raws.into_iter()
        .map(|raw| {
            let inst = Instrument::resolve(exchange, market_type, &raw.symbol, true)?;
            bbo::normalize(raw, &inst, received_at, json)
        })
        .collect()
}

pub(crate) fn klines(
    exchange: Exchange,
    market_type: MarketType,
    raws: Vec<RawKline>,
    received_at: Option<u64>,
    json: &str,
) -> Result<Vec<KlineMsg>> {
    raws.into_iter()
        .map(|raw| {
            let inst = Instrument::resolve(exchange, market_type, &raw.symbol, false)?;
            kline::normalize(raw, &inst, received_at, json)
        })
        .collect()
}

pub(crate) fn funding_rates(
    exchange: Exchange,
    market_type: MarketType,
    raws: Vec<RawFundingRate>,
    received_at: Option<u64>,
    json: &str,
) -> Result<Vec<FundingRateMsg>> {
    raws.into_iter()
        .map(|raw| {
            let inst = Instrument::resolve(exchange, market_type, &raw.symbol, false)?;
            funding_rate::normalize(raw, &inst, received_at, json)
        })
        .collect()
}

pub(crate) fn open_interests(
    exchange: Exchange,
    market_type: MarketType,
    raws: Vec<RawOpenInterest>,
    received_at: Option<u64>,
    json: &str,
) -> Result<Vec<OpenInterestMsg>> {
    raws.into_iter()
        .map(|raw| {
            let inst = Instrument::resolve(exchange, market_type, &raw.symbol, false)?;
            open_interest::normalize(raw, &inst, received_at, json)
        })
        .collect()
}
