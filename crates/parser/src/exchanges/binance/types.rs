//! Binance wire types for the combined-stream WebSocket API and the
//! `openInterest` REST endpoint.
//!
//! Field names follow the single-letter keys Binance emits; numbers arrive
//! as decimal strings and are retyped by the matcher.

use serde::Deserialize;
use serde_json::Value;

/// Combined-stream envelope: `{"stream": "btcusdt@aggTrade", "data": {...}}`.
#[derive(Debug, Deserialize)]
pub struct BinanceEnvelope<T> {
    /// Stream name, lowercase symbol then `@` and the channel.
    pub stream: String,
    pub data: T,
}

impl<T> BinanceEnvelope<T> {
    /// Channel part of the stream name (`aggTrade`, `depth20@100ms`, ...).
    /// All-market streams (`!markPrice@arr`) have no symbol part.
    pub fn channel(&self) -> &str {
        match self.stream.strip_prefix('!') {
            Some(all_market) => all_market,
            None => self.stream.split_once('@').map_or("", |(_, c)| c),
        }
    }

    /// Channel name without update-speed or `@arr` suffixes.
    pub fn channel_name(&self) -> &str {
        let channel = self.channel();
        channel.split('@').next().unwrap_or(channel)
    }

    /// Symbol part of the stream name, upper-cased. `None` for
    /// all-market streams.
    pub fn stream_symbol(&self) -> Option<String> {
        if self.stream.starts_with('!') {
            return None;
        }
        self.stream
            .split_once('@')
            .map(|(s, _)| s.to_ascii_uppercase())
    }
}

/// Aggregated trade from the `@aggTrade` stream.
#[derive(Debug, Deserialize)]
pub struct BinanceAggTrade {
    #[serde(rename = "s")]
    pub symbol: String,
    /// Aggregate trade ID.
    #[serde(rename = "a")]
    pub agg_trade_id: u64,
    #[serde(rename = "p")]
    pub price: String,
    /// Quantity: base units on spot and USDⓈ-M, contracts on COIN-M.
    #[serde(rename = "q")]
    pub quantity: String,
    #[serde(rename = "T")]
    pub trade_time: u64,
    /// `true` if the buyer is the market maker (the trade was a sell).
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

/// Raw trade from the `@trade` stream.
#[derive(Debug, Deserialize)]
pub struct BinanceTrade {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "t")]
    pub trade_id: u64,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "q")]
    pub quantity: String,
    #[serde(rename = "T")]
    pub trade_time: u64,
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

/// Diff depth event from the `@depth` stream; futures also use it for the
/// partial-depth `@depthN` streams.
#[derive(Debug, Deserialize)]
pub struct BinanceDepthUpdate {
    #[serde(rename = "E")]
    pub event_time: u64,
    #[serde(rename = "s")]
    pub symbol: String,
    /// First update ID in event.
    #[serde(rename = "U")]
    pub first_update_id: u64,
    /// Final update ID in event.
    #[serde(rename = "u")]
    pub last_update_id: u64,
    /// Final update ID of the previous event (futures only).
    #[serde(rename = "pu")]
    pub prev_last_update_id: Option<u64>,
    #[serde(rename = "b")]
    pub bids: Vec<[String; 2]>,
    #[serde(rename = "a")]
    pub asks: Vec<[String; 2]>,
}

/// Spot partial book from `@depthN`; carries neither symbol nor time.
#[derive(Debug, Deserialize)]
pub struct BinancePartialDepth {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: u64,
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

/// Best bid/ask from `@bookTicker`. Spot omits the event time.
#[derive(Debug, Deserialize)]
pub struct BinanceBookTicker {
    #[serde(rename = "u")]
    pub update_id: u64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "b")]
    pub bid_price: String,
    #[serde(rename = "B")]
    pub bid_qty: String,
    #[serde(rename = "a")]
    pub ask_price: String,
    #[serde(rename = "A")]
    pub ask_qty: String,
    #[serde(rename = "E")]
    pub event_time: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct BinanceKlineEvent {
    #[serde(rename = "E")]
    pub event_time: u64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "k")]
    pub kline: BinanceKline,
}

#[derive(Debug, Deserialize)]
pub struct BinanceKline {
    /// Bar open time, milliseconds.
    #[serde(rename = "t")]
    pub start_time: u64,
    #[serde(rename = "i")]
    pub interval: String,
    #[serde(rename = "o")]
    pub open: String,
    #[serde(rename = "h")]
    pub high: String,
    #[serde(rename = "l")]
    pub low: String,
    #[serde(rename = "c")]
    pub close: String,
    /// Base asset volume.
    #[serde(rename = "v")]
    pub volume: String,
    /// Quote asset volume.
    #[serde(rename = "q")]
    pub quote_volume: String,
}

/// `markPriceUpdate` from `@markPrice`, carrying the funding rate.
#[derive(Debug, Deserialize)]
pub struct BinanceMarkPrice {
    #[serde(rename = "E")]
    pub event_time: u64,
    #[serde(rename = "s")]
    pub symbol: String,
    /// Funding rate; empty for delivery contracts.
    #[serde(rename = "r")]
    pub funding_rate: String,
    /// Next funding time.
    #[serde(rename = "T")]
    pub next_funding_time: u64,
}

/// REST `GET /fapi/v1/openInterest` and `/dapi/v1/openInterest` response.
#[derive(Debug, Deserialize)]
pub struct BinanceOpenInterest {
    pub symbol: String,
    #[serde(rename = "openInterest")]
    pub open_interest: String,
    pub time: u64,
}

/// Event-type and time fields shared by every stream payload.
#[derive(Debug, Deserialize)]
pub struct BinanceEventHeader {
    #[serde(rename = "e")]
    pub event_type: Option<String>,
    #[serde(rename = "E")]
    pub event_time: Option<Value>,
    #[serde(rename = "s")]
    pub symbol: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGG_TRADE: &str = r#"{"stream":"btcusd_perp@aggTrade","data":{"e":"aggTrade","E":1616201883458,"a":41045788,"s":"BTCUSD_PERP","p":"58570.1","q":"58","f":91864326,"l":91864327,"T":1616201883304,"m":true}}"#;

    #[test]
    fn test_deserialize_agg_trade() {
        let env: BinanceEnvelope<BinanceAggTrade> =
            serde_json::from_str(AGG_TRADE).expect("deserialize aggTrade");
        assert_eq!(env.channel(), "aggTrade");
        assert_eq!(env.stream_symbol().as_deref(), Some("BTCUSD_PERP"));
        assert_eq!(env.data.agg_trade_id, 41045788);
        assert_eq!(env.data.quantity, "58");
        assert!(env.data.is_buyer_maker);
    }

    #[test]
    fn test_channel_names() {
        let env = |stream: &str| BinanceEnvelope {
            stream: stream.to_string(),
            data: (),
        };
        assert_eq!(env("ethusdt@depth20@100ms").channel_name(), "depth20");
        assert_eq!(env("btcusdt@kline_1m").channel_name(), "kline_1m");
        assert_eq!(env("!markPrice@arr@1s").channel_name(), "markPrice");
        assert_eq!(env("!markPrice@arr@1s").stream_symbol(), None);
    }

    #[test]
    fn test_deserialize_spot_partial_depth() {
        let raw = r#"{"lastUpdateId":160,"bids":[["0.0024","10"]],"asks":[["0.0026","100"]]}"#;
        let depth: BinancePartialDepth = serde_json::from_str(raw).expect("deserialize depth");
        assert_eq!(depth.last_update_id, 160);
        assert_eq!(depth.bids[0][1], "10");
    }

    #[test]
    fn test_depth_update_without_pu() {
        let raw = r#"{"e":"depthUpdate","E":123456789,"s":"BNBBTC","U":157,"u":160,"b":[["0.0024","10"]],"a":[]}"#;
        let depth: BinanceDepthUpdate = serde_json::from_str(raw).expect("deserialize depth");
        assert_eq!(depth.prev_last_update_id, None);
        assert!(depth.asks.is_empty());
    }
}
