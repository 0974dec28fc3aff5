//! Deribit JSON-RPC subscription notifications.
//!
//! `{"jsonrpc":"2.0","method":"subscription","params":{"channel":..,"data":..}}`.
//! Unlike most venues Deribit sends numbers as JSON numbers.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct DeribitNotification<T> {
    pub params: DeribitParams<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeribitParams<T> {
    /// Dotted channel, e.g. `book.BTC-PERPETUAL.100ms`.
    pub channel: String,
    pub data: T,
}

impl<T> DeribitNotification<T> {
    pub fn channel_parts(&self) -> Vec<&str> {
        self.params.channel.split('.').collect()
    }

    pub fn channel_kind(&self) -> &str {
        self.params.channel.split('.').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeribitTrade {
    pub trade_id: String,
    pub timestamp: u64,
    pub price: f64,
    /// USD on inverse futures, base currency on options and linear.
    pub amount: f64,
    /// Taker side.
    pub direction: String,
    pub instrument_name: String,
}

/// Book notification from `book.{instrument}.{interval}` or the grouped
/// `book.{instrument}.{group}.{depth}.{interval}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeribitBook {
    /// `snapshot` or `change`; absent on grouped books.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub timestamp: u64,
    pub instrument_name: String,
    pub change_id: u64,
    pub prev_change_id: Option<u64>,
    /// `[action, price, amount]` on raw books, `[price, amount]` on grouped.
    pub bids: Vec<Vec<Value>>,
    pub asks: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeribitQuote {
    pub timestamp: u64,
    pub instrument_name: String,
    /// 0 or null when the side is empty.
    pub best_bid_price: Option<f64>,
    pub best_bid_amount: Option<f64>,
    pub best_ask_price: Option<f64>,
    pub best_ask_amount: Option<f64>,
}

/// Candle from `chart.trades.{instrument}.{resolution}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeribitChart {
    /// Bar start, milliseconds.
    pub tick: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Base currency.
    pub volume: f64,
    /// Quote currency.
    pub cost: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeribitTicker {
    pub timestamp: u64,
    pub instrument_name: String,
    /// Perpetuals only.
    pub funding_8h: Option<f64>,
    pub current_funding: Option<f64>,
    pub open_interest: f64,
}

/// Fields read by the symbol and timestamp extractors.
#[derive(Debug, Clone, Deserialize)]
pub struct DeribitItemHeader {
    pub instrument_name: Option<String>,
    pub timestamp: Option<Value>,
    pub tick: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parts() {
        let n: DeribitNotification<Value> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"subscription","params":{"channel":"book.BTC-PERPETUAL.none.10.100ms","data":{}}}"#,
        )
        .unwrap();
        assert_eq!(n.channel_kind(), "book");
        assert_eq!(n.channel_parts().len(), 5);
    }
}
