//! Bybit v5 public WebSocket wire types.
//!
//! Every push shares the same envelope: a dotted `topic` naming the channel
//! and symbol, a `type` of `snapshot` or `delta`, a server timestamp and a
//! channel-specific `data` payload.

use serde::Deserialize;
use serde_json::Value;

/// Top-level push envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct BybitWsMessage {
    /// Topic name (e.g., "orderbook.200.BTCUSDT").
    pub topic: String,
    /// Message type: "snapshot" or "delta".
    #[serde(rename = "type")]
    pub msg_type: Option<String>,
    /// Server timestamp in milliseconds.
    pub ts: Option<u64>,
    /// Message payload (varies by topic).
    pub data: Value,
}

impl BybitWsMessage {
    /// Channel, the first topic segment.
    pub fn channel(&self) -> &str {
        self.topic.split('.').next().unwrap_or_default()
    }

    /// Symbol, the last topic segment.
    pub fn topic_symbol(&self) -> &str {
        self.topic.rsplit('.').next().unwrap_or_default()
    }

    /// Order-book depth from `orderbook.{depth}.{symbol}`.
    pub fn book_depth(&self) -> Option<usize> {
        let mut parts = self.topic.split('.');
        match (parts.next(), parts.next()) {
            (Some("orderbook"), Some(depth)) => depth.parse().ok(),
            _ => None,
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.msg_type.as_deref() == Some("snapshot")
    }
}

/// Bybit orderbook data from a snapshot or delta message.
#[derive(Debug, Clone, Deserialize)]
pub struct BybitOrderbook {
    /// Symbol name (e.g., "BTCUSDT").
    pub s: String,
    /// Bid levels as `[price_string, qty_string]` pairs.
    pub b: Vec<[String; 2]>,
    /// Ask levels as `[price_string, qty_string]` pairs.
    pub a: Vec<[String; 2]>,
    /// Update ID; `1` on a service-restart snapshot.
    pub u: u64,
}

/// Bybit public trade entry.
#[derive(Debug, Clone, Deserialize)]
pub struct BybitTrade {
    /// Trade timestamp in milliseconds.
    #[serde(rename = "T")]
    pub timestamp: u64,
    /// Symbol name.
    pub s: String,
    /// Taker side: "Buy" or "Sell".
    #[serde(rename = "S")]
    pub side: String,
    /// Quantity as a string.
    pub v: String,
    /// Price as a string.
    pub p: String,
    /// Trade ID.
    pub i: String,
}

/// One candle from `kline.{interval}.{symbol}`.
#[derive(Debug, Clone, Deserialize)]
pub struct BybitKline {
    pub start: u64,
    pub interval: String,
    pub open: String,
    pub close: String,
    pub high: String,
    pub low: String,
    /// Base units on linear and spot, USD on inverse.
    pub volume: String,
    /// Quote units on linear and spot, coin on inverse.
    pub turnover: String,
    pub timestamp: Option<u64>,
}

/// `tickers.{symbol}` payload; deltas only carry the fields that changed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitTicker {
    pub symbol: String,
    pub funding_rate: Option<String>,
    pub next_funding_time: Option<String>,
    pub open_interest: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_orderbook_delta() {
        let json = r#"{
            "s": "BTCUSDT",
            "b": [
                ["64999.00", "0"]
            ],
            "a": [
                ["65001.00", "3.500"]
            ],
            "u": 1234568,
            "seq": 101
        }"#;

        let ob: BybitOrderbook = serde_json::from_str(json).unwrap();
        assert_eq!(ob.b.len(), 1);
        assert_eq!(ob.b[0][1], "0"); // removal
        // Books chain on `u`; the cross sequence is ignored.
        assert_eq!(ob.u, 1234568);
    }

    #[test]
    fn test_topic_parts() {
        let msg: BybitWsMessage = serde_json::from_str(
            r#"{"topic":"orderbook.50.BTCUSDT","type":"snapshot","ts":1,"data":{}}"#,
        )
        .unwrap();
        assert_eq!(msg.channel(), "orderbook");
        assert_eq!(msg.topic_symbol(), "BTCUSDT");
        assert_eq!(msg.book_depth(), Some(50));
        assert!(msg.is_snapshot());
    }

    #[test]
    fn test_ticker_delta_without_rate() {
        let ticker: BybitTicker =
            serde_json::from_str(r#"{"symbol":"BTCUSDT","lastPrice":"16800"}"#).unwrap();
        assert_eq!(ticker.funding_rate, None);
        assert_eq!(ticker.open_interest, None);
    }
}
