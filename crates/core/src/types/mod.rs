//! Core types for crypto-msg-parser.
//!
//! Enumerations are closed sets with stable string forms; records are plain
//! values that serialize to one JSON object each.

pub mod exchange;
pub mod market;
pub mod market_data;

// Re-export primary types for convenient access via `cmp_core::types::*`.
pub use exchange::{Exchange, TradeSide};
pub use market::{MarketType, MessageType};
pub use market_data::{
    BboMsg, FundingRateMsg, KlineMsg, OpenInterestMsg, OpenInterestUnit, Order, OrderBookMsg,
    TradeMsg,
};
