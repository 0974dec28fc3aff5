//! BitMEX realtime API wire types.
//!
//! Every push names its `table`, an `action` (`partial`, `update`,
//! `insert`, `delete`) and a `data` array of rows. Times are ISO-8601.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct BitmexPush<T> {
    pub table: String,
    pub action: Option<String>,
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitmexTrade {
    pub timestamp: String,
    pub symbol: String,
    /// Taker side, `Buy` or `Sell`; empty on index ticks.
    #[serde(default)]
    pub side: String,
    /// Contracts; 0 on index ticks.
    pub size: f64,
    pub price: f64,
    /// `PlusTick`, `ZeroMinusTick`, ...
    pub tick_direction: Option<String>,
    /// All zeros on index ticks.
    #[serde(rename = "trdMatchID")]
    pub trd_match_id: Option<String>,
}

/// Row of `orderBookL2` / `orderBookL2_25`.
#[derive(Debug, Clone, Deserialize)]
pub struct BitmexL2Row {
    pub symbol: String,
    pub side: String,
    /// Absent on `delete`.
    pub size: Option<f64>,
    pub price: Option<f64>,
    pub timestamp: Option<String>,
}

/// Row of `orderBook10`.
#[derive(Debug, Clone, Deserialize)]
pub struct BitmexBook10 {
    pub symbol: String,
    /// `[price, size]`.
    pub bids: Vec<[f64; 2]>,
    pub asks: Vec<[f64; 2]>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitmexQuote {
    pub timestamp: String,
    pub symbol: String,
    /// Null while the side of the book is empty.
    pub bid_size: Option<f64>,
    pub bid_price: Option<f64>,
    pub ask_price: Option<f64>,
    pub ask_size: Option<f64>,
}

/// Row of `tradeBin1m` and friends; `timestamp` is the bar close.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitmexTradeBin {
    pub timestamp: String,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Base-currency volume.
    pub home_notional: f64,
    /// Quote-currency volume.
    pub foreign_notional: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitmexFunding {
    /// Time the rate applies.
    pub timestamp: String,
    pub symbol: String,
    pub funding_rate: f64,
}

/// `instrument` rows are sparse; only the fields we read are listed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitmexInstrument {
    pub symbol: String,
    pub open_interest: Option<f64>,
    /// Current value of index instruments such as `.BVOL24H`.
    pub last_price: Option<f64>,
    pub last_tick_direction: Option<String>,
    pub timestamp: Option<String>,
}

/// Fields read by the symbol and timestamp extractors.
#[derive(Debug, Clone, Deserialize)]
pub struct BitmexRowHeader {
    pub symbol: Option<String>,
    pub timestamp: Option<Value>,
}
