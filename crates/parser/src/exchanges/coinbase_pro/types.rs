//! Coinbase Pro websocket feed messages.
//!
//! Every message is a flat object tagged by `type`. Prices and sizes are
//! decimal strings; `time` is ISO-8601 with microseconds.

use serde::Deserialize;

/// `match` / `last_match`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinbaseMatch {
    pub trade_id: u64,
    pub product_id: String,
    pub time: String,
    pub size: String,
    pub price: String,
    /// Maker order side.
    pub side: String,
}

/// `snapshot`: full book, no timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinbaseSnapshot {
    pub product_id: String,
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

/// `l2update`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinbaseL2Update {
    pub product_id: String,
    pub time: String,
    /// `[side, price, size]`; size `0` removes the level.
    pub changes: Vec<[String; 3]>,
}

/// `ticker`. Early tickers lack the best size fields.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinbaseTicker {
    pub product_id: String,
    pub sequence: Option<u64>,
    pub time: Option<String>,
    pub best_bid: String,
    pub best_bid_size: Option<String>,
    pub best_ask: String,
    pub best_ask_size: Option<String>,
}

/// Fields read by the classifier and the extractors.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinbaseHeader {
    #[serde(rename = "type")]
    pub kind: String,
    pub product_id: Option<String>,
    pub time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_l2update() {
        let raw = r#"{"type":"l2update","product_id":"BTC-USD","changes":[["buy","10101.80000000","0.162567"]],"time":"2019-08-14T20:42:27.265Z"}"#;
        let u: CoinbaseL2Update = serde_json::from_str(raw).unwrap();
        assert_eq!(u.changes[0][0], "buy");
        assert_eq!(u.changes[0][2], "0.162567");
    }
}
