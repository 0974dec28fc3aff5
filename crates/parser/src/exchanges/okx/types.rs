//! OKX v5 public WebSocket wire types.
//!
//! Pushes carry the subscription in `arg` and a `data` array. Numbers and
//! timestamps are strings throughout.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct OkxPush<T> {
    pub arg: OkxChannelArg,
    /// `snapshot` or `update` on incremental book channels.
    pub action: Option<String>,
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OkxChannelArg {
    pub channel: String,
    /// Absent on `instType`-wide subscriptions.
    #[serde(rename = "instId")]
    pub inst_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkxTrade {
    pub inst_id: String,
    pub trade_id: String,
    pub px: String,
    /// Base units on spot, contracts on derivatives.
    pub sz: String,
    /// Taker side.
    pub side: String,
    pub ts: String,
}

/// Book data shared by `books*` and `bbo-tbt`.
#[derive(Debug, Clone, Deserialize)]
pub struct OkxDepthData {
    /// `[price, size, liquidated_orders, orders]`.
    pub asks: Vec<Vec<String>>,
    pub bids: Vec<Vec<String>>,
    #[serde(rename = "ts")]
    pub timestamp: String,
    /// `-1` on the first snapshot.
    #[serde(rename = "prevSeqId")]
    pub prev_seq_id: Option<i64>,
    #[serde(rename = "seqId")]
    pub seq_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkxFundingRate {
    pub inst_id: String,
    pub funding_rate: String,
    pub funding_time: String,
    /// Empty once the next rate is not yet published.
    pub next_funding_rate: Option<String>,
    pub ts: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkxOpenInterest {
    pub inst_id: String,
    /// Contracts.
    pub oi: String,
    pub ts: String,
}

/// Instrument of one `data` entry, for `instType`-wide subscriptions.
#[derive(Debug, Clone, Deserialize)]
pub struct OkxItemHeader {
    #[serde(rename = "instId")]
    pub inst_id: Option<String>,
}
