//! Exchange identifiers and trade side.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported exchanges.
///
/// Serialized as the lowercase venue identifier used on the public API
/// (`"binance"`, `"coinbase_pro"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exchange {
    /// Binance spot, USDⓈ-M and COIN-M futures.
    Binance,
    /// Bybit v5 unified public feeds.
    Bybit,
    /// OKX v5 public feeds.
    Okx,
    /// Deribit JSON-RPC subscriptions.
    Deribit,
    /// BitMEX realtime tables.
    Bitmex,
    /// Coinbase Pro (Exchange) websocket feed.
    CoinbasePro,
}

impl Exchange {
    pub const ALL: [Exchange; 6] = [
        Exchange::Binance,
        Exchange::Bybit,
        Exchange::Okx,
        Exchange::Deribit,
        Exchange::Bitmex,
        Exchange::CoinbasePro,
    ];

    /// Lowercase venue identifier.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Bybit => "bybit",
            Exchange::Okx => "okx",
            Exchange::Deribit => "deribit",
            Exchange::Bitmex => "bitmex",
            Exchange::CoinbasePro => "coinbase_pro",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Exchange::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == lower)
            .ok_or_else(|| format!("unsupported exchange '{s}'"))
    }
}

/// Taker side of a trade (the aggressor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// The opposite side.
    pub const fn flip(self) -> Self {
        match self {
            TradeSide::Buy => TradeSide::Sell,
            TradeSide::Sell => TradeSide::Buy,
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}
