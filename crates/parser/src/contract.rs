//! Contract specifications for contract-denominated markets.
//!
//! [`contract_value`] answers "how much does one contract of this symbol
//! represent". The answer comes from an embedded rule table that is indexed
//! once, on first use, into a process-wide map and never mutated afterwards.
//!
//! Rules are keyed by `(exchange, market_type)`. Within a key the most
//! specific symbol pattern wins: the longest matching prefix, then the
//! market-wide default. A key or symbol with no rule is an error; there is
//! no implicit size of 1.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use cmp_core::types::{Exchange, MarketType};

use crate::error::{ParseError, Result};

/// How a derivative settles, which decides what one contract is worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Settlement {
    /// One contract is `size` units of the base currency.
    Linear,
    /// One contract is `size` units of the quote currency.
    Inverse,
    /// One contract pays `size` units of a third settlement currency per
    /// point of the quoted price (BitMEX `ETHUSD` pays XBT).
    Quanto,
}

/// Nominal value of one contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractSpec {
    pub settlement: Settlement,
    pub size: f64,
}

impl ContractSpec {
    pub const fn linear(size: f64) -> Self {
        Self {
            settlement: Settlement::Linear,
            size,
        }
    }

    pub const fn inverse(size: f64) -> Self {
        Self {
            settlement: Settlement::Inverse,
            size,
        }
    }

    pub const fn quanto(multiplier: f64) -> Self {
        Self {
            settlement: Settlement::Quanto,
            size: multiplier,
        }
    }

    pub fn is_inverse(&self) -> bool {
        self.settlement == Settlement::Inverse
    }
}

/// Which symbols a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolPattern {
    Prefix(&'static str),
    Any,
}

impl SymbolPattern {
    /// Match specificity; `None` when the pattern does not apply.
    fn rank(&self, symbol: &str) -> Option<usize> {
        match self {
            SymbolPattern::Prefix(p) if symbol.starts_with(*p) => Some(p.len()),
            SymbolPattern::Any => Some(0),
            _ => None,
        }
    }
}

struct ContractRule {
    exchange: Exchange,
    market_types: &'static [MarketType],
    symbol: SymbolPattern,
    spec: ContractSpec,
}

const INVERSE: &[MarketType] = &[MarketType::InverseFuture, MarketType::InverseSwap];
const LINEAR: &[MarketType] = &[MarketType::LinearFuture, MarketType::LinearSwap];
const OPTION: &[MarketType] = &[MarketType::EuropeanOption];
const QUANTO: &[MarketType] = &[MarketType::QuantoFuture, MarketType::QuantoSwap];

const fn rule(
    exchange: Exchange,
    market_types: &'static [MarketType],
    symbol: SymbolPattern,
    spec: ContractSpec,
) -> ContractRule {
    ContractRule {
        exchange,
        market_types,
        symbol,
        spec,
    }
}

use SymbolPattern::{Any, Prefix};

#[rustfmt::skip]
static CONTRACT_RULES: &[ContractRule] = &[
    // Binance COIN-M: BTC contracts are 100 USD, everything else 10 USD.
    rule(Exchange::Binance, INVERSE, Prefix("BTCUSD_"), ContractSpec::inverse(100.0)),
    rule(Exchange::Binance, INVERSE, Any, ContractSpec::inverse(10.0)),
    // Binance USDⓈ-M quantities are already in base currency.
    rule(Exchange::Binance, LINEAR, Any, ContractSpec::linear(1.0)),

    rule(Exchange::Bybit, INVERSE, Any, ContractSpec::inverse(1.0)),
    rule(Exchange::Bybit, LINEAR, Any, ContractSpec::linear(1.0)),

    rule(Exchange::Okx, INVERSE, Prefix("BTC-USD-"), ContractSpec::inverse(100.0)),
    rule(Exchange::Okx, INVERSE, Any, ContractSpec::inverse(10.0)),
    rule(Exchange::Okx, LINEAR, Prefix("BTC-USDT-"), ContractSpec::linear(0.01)),
    rule(Exchange::Okx, LINEAR, Prefix("ETH-USDT-"), ContractSpec::linear(0.1)),
    rule(Exchange::Okx, LINEAR, Prefix("SOL-USDT-"), ContractSpec::linear(1.0)),
    rule(Exchange::Okx, LINEAR, Prefix("LTC-USDT-"), ContractSpec::linear(1.0)),
    rule(Exchange::Okx, LINEAR, Prefix("DOT-USDT-"), ContractSpec::linear(1.0)),
    rule(Exchange::Okx, LINEAR, Prefix("XRP-USDT-"), ContractSpec::linear(100.0)),
    rule(Exchange::Okx, LINEAR, Prefix("ADA-USDT-"), ContractSpec::linear(100.0)),
    rule(Exchange::Okx, LINEAR, Prefix("DOGE-USDT-"), ContractSpec::linear(1000.0)),
    rule(Exchange::Okx, LINEAR, Prefix("BTC-USDC-"), ContractSpec::linear(0.0001)),
    rule(Exchange::Okx, LINEAR, Prefix("ETH-USDC-"), ContractSpec::linear(0.001)),
    rule(Exchange::Okx, OPTION, Prefix("BTC-USD-"), ContractSpec::linear(0.01)),
    rule(Exchange::Okx, OPTION, Prefix("ETH-USD-"), ContractSpec::linear(0.1)),

    rule(Exchange::Deribit, INVERSE, Prefix("BTC-"), ContractSpec::inverse(10.0)),
    rule(Exchange::Deribit, INVERSE, Prefix("ETH-"), ContractSpec::inverse(1.0)),
    rule(Exchange::Deribit, &[MarketType::LinearSwap], Any, ContractSpec::linear(1.0)),
    rule(Exchange::Deribit, OPTION, Any, ContractSpec::linear(1.0)),

    rule(Exchange::Bitmex, INVERSE, Any, ContractSpec::inverse(1.0)),
    // 100 satoshi per contract per USD of price.
    rule(Exchange::Bitmex, QUANTO, Prefix("ETHUSD"), ContractSpec::quanto(0.000_001)),
    rule(Exchange::Bitmex, QUANTO, Prefix("XRPUSD"), ContractSpec::quanto(0.0002)),
];

type RuleIndex = HashMap<(Exchange, MarketType), Vec<(SymbolPattern, ContractSpec)>>;

static RULE_INDEX: Lazy<RuleIndex> = Lazy::new(|| {
    let mut index: RuleIndex = HashMap::new();
    for r in CONTRACT_RULES {
        for &market_type in r.market_types {
            index
                .entry((r.exchange, market_type))
                .or_default()
                .push((r.symbol, r.spec));
        }
    }
    index
});

/// Look up the contract specification of a symbol.
///
/// # Errors
///
/// Returns [`ParseError::UnknownContractSpec`] when no rule covers the
/// `(exchange, market_type, symbol)` triple.
pub fn contract_value(
    exchange: Exchange,
    market_type: MarketType,
    symbol: &str,
) -> Result<ContractSpec> {
    RULE_INDEX
        .get(&(exchange, market_type))
        .and_then(|rules| {
            rules
                .iter()
                .filter_map(|(pattern, spec)| pattern.rank(symbol).map(|rank| (rank, spec)))
                .max_by_key(|(rank, _)| *rank)
                .map(|(_, spec)| *spec)
        })
        .ok_or_else(|| ParseError::UnknownContractSpec {
            exchange,
            market_type,
            symbol: symbol.to_string(),
        })
}
