//! BitMEX matchers: inverse and quanto futures and perpetuals, plus the
//! `.BVOL*` volatility indices.

pub mod types;

use cmp_core::types::{
    BboMsg, Exchange, FundingRateMsg, KlineMsg, MarketType, MessageType, OpenInterestMsg,
    OpenInterestUnit, OrderBookMsg, TradeMsg,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use self::types::{
    BitmexBook10, BitmexFunding, BitmexInstrument, BitmexL2Row, BitmexPush, BitmexQuote,
    BitmexRowHeader, BitmexTrade, BitmexTradeBin,
};
use super::{require_market, single_symbol, ExchangeParser};
use crate::error::{ParseError, Result};
use crate::fields::{iso_millis, max_millis, value_millis};
use crate::normalize::kline::{canonical_period, period_seconds};
use crate::normalize::{
    self, QuantityUnit, RawBbo, RawFundingRate, RawKline, RawOpenInterest, RawOrderBook, RawTrade,
    SideCue,
};

pub(crate) struct BitmexParser;

const MARKETS: &[MarketType] = &[
    MarketType::InverseFuture,
    MarketType::InverseSwap,
    MarketType::QuantoFuture,
    MarketType::QuantoSwap,
];

/// Index values are published as ticks only.
const TRADE_MARKETS: &[MarketType] = &[
    MarketType::InverseFuture,
    MarketType::InverseSwap,
    MarketType::QuantoFuture,
    MarketType::QuantoSwap,
    MarketType::Bvol,
];

const BOOK10_DEPTH: usize = 10;

fn table_type(table: &str) -> MessageType {
    match table {
        "trade" => MessageType::Trade,
        "orderBookL2" | "orderBookL2_25" => MessageType::L2Event,
        "orderBook10" => MessageType::L2TopK,
        "quote" => MessageType::Bbo,
        "funding" => MessageType::FundingRate,
        "instrument" => MessageType::Ticker,
        t if t.starts_with("tradeBin") => MessageType::Candlestick,
        _ => MessageType::Other,
    }
}

fn parse_push<T: DeserializeOwned>(msg: &str, expected: MessageType) -> Result<BitmexPush<T>> {
    let push: BitmexPush<T> = serde_json::from_str(msg)?;
    if table_type(&push.table) == expected {
        Ok(push)
    } else {
        Err(ParseError::malformed(format!(
            "table {} is not a {expected} table",
            push.table
        )))
    }
}

fn tick_side(tick_direction: Option<&str>) -> &'static str {
    match tick_direction {
        Some("MinusTick" | "ZeroMinusTick") => "Sell",
        _ => "Buy",
    }
}

/// Index ticks carry an all-zero match id.
fn match_id(id: Option<String>) -> Option<String> {
    id.filter(|id| id.bytes().any(|b| b != b'0' && b != b'-'))
}

fn trade_row(t: BitmexTrade) -> Result<RawTrade> {
    let side = if t.side.is_empty() {
        tick_side(t.tick_direction.as_deref()).to_string()
    } else {
        t.side
    };
    Ok(RawTrade {
        timestamp: iso_millis(&t.timestamp)?,
        price: t.price,
        quantity: t.size,
        unit: QuantityUnit::Contracts,
        side: SideCue::Taker(side),
        trade_id: match_id(t.trd_match_id),
        symbol: t.symbol,
    })
}

/// Volatility index values from `trade` ticks or `instrument` updates.
fn index_ticks(msg: &str, table: MessageType) -> Result<Vec<RawTrade>> {
    let mut raws = if table == MessageType::Ticker {
        let push: BitmexPush<BitmexInstrument> = parse_push(msg, MessageType::Ticker)?;
        let mut raws = Vec::with_capacity(push.data.len());
        for row in push.data {
            // Updates without a value only touch other fields.
            let Some(price) = row.last_price else {
                continue;
            };
            let ts = row
                .timestamp
                .as_deref()
                .ok_or_else(|| ParseError::malformed("instrument row without timestamp"))?;
            raws.push(RawTrade {
                timestamp: iso_millis(ts)?,
                price,
                quantity: 0.0,
                unit: QuantityUnit::Base,
                side: SideCue::Taker(tick_side(row.last_tick_direction.as_deref()).to_string()),
                trade_id: None,
                symbol: row.symbol,
            });
        }
        raws
    } else {
        let push: BitmexPush<BitmexTrade> = parse_push(msg, MessageType::Trade)?;
        push.data.into_iter().map(trade_row).collect::<Result<Vec<_>>>()?
    };
    if let Some(raw) = raws.iter().find(|r| !r.symbol.starts_with('.')) {
        return Err(ParseError::malformed(format!("{} is not an index", raw.symbol)));
    }
    for raw in &mut raws {
        raw.quantity = 0.0;
        raw.unit = QuantityUnit::Base;
    }
    Ok(raws)
}

/// Split L2 rows into one book per symbol, keeping row order.
fn group_l2_rows(rows: Vec<BitmexL2Row>, snapshot: bool) -> Result<Vec<RawOrderBook>> {
    let mut books: Vec<RawOrderBook> = Vec::new();
    for row in rows {
        let price = row
            .price
            .ok_or_else(|| ParseError::malformed("orderBookL2 row without price"))?;
        // Deletes carry no size.
        let level = (price, row.size.unwrap_or(0.0));
        let ts = row.timestamp.as_deref().map(iso_millis).transpose()?;
        let idx = match books.iter().position(|b| b.symbol == row.symbol) {
            Some(idx) => idx,
            None => {
                books.push(RawOrderBook {
                    symbol: row.symbol.clone(),
                    timestamp: None,
                    asks: Vec::new(),
                    bids: Vec::new(),
                    unit: QuantityUnit::Contracts,
                    snapshot,
                    seq_id: None,
                    prev_seq_id: None,
                });
                books.len() - 1
            }
        };
        let book = &mut books[idx];
        book.timestamp = max_millis(book.timestamp, ts);
        match row.side.as_str() {
            "Sell" => book.asks.push(level),
            "Buy" => book.bids.push(level),
            other => return Err(ParseError::malformed(format!("unknown book side '{other}'"))),
        }
    }
    Ok(books)
}

impl ExchangeParser for BitmexParser {
    const EXCHANGE: Exchange = Exchange::Bitmex;

    fn msg_type(&self, msg: &str) -> MessageType {
        serde_json::from_str::<BitmexPush<Value>>(msg)
            .map_or(MessageType::Other, |push| table_type(&push.table))
    }

    fn extract_symbol(&self, _market_type: MarketType, msg: &str) -> Result<String> {
        let push: BitmexPush<BitmexRowHeader> = serde_json::from_str(msg)?;
        single_symbol(push.data.iter().filter_map(|r| r.symbol.as_deref()))
    }

    fn extract_timestamp(&self, _market_type: MarketType, msg: &str) -> Result<Option<u64>> {
        let push: BitmexPush<BitmexRowHeader> = serde_json::from_str(msg)?;
        push.data.iter().try_fold(None, |acc, row| -> Result<Option<u64>> {
            let ts = match &row.timestamp {
                Some(v) => value_millis(v)?,
                None => None,
            };
            Ok(max_millis(acc, ts))
        })
    }

    fn parse_trade(&self, market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Trade, TRADE_MARKETS)?;
        let raws = if market_type == MarketType::Bvol {
            index_ticks(msg, self.msg_type(msg))?
        } else {
            let push: BitmexPush<BitmexTrade> = parse_push(msg, MessageType::Trade)?;
            push.data.into_iter().map(trade_row).collect::<Result<Vec<_>>>()?
        };
        normalize::trades(Self::EXCHANGE, market_type, raws, msg)
    }

    fn parse_l2(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OrderBookMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::L2Event, MARKETS)?;
        let push: BitmexPush<BitmexL2Row> = parse_push(msg, MessageType::L2Event)?;
        let snapshot = push.action.as_deref() == Some("partial");
        let raws = group_l2_rows(push.data, snapshot)?;
        normalize::l2_books(Self::EXCHANGE, market_type, raws, received_at, msg)
    }

    fn parse_l2_topk(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OrderBookMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::L2TopK, MARKETS)?;
        let push: BitmexPush<BitmexBook10> = parse_push(msg, MessageType::L2TopK)?;
        let raws = push
            .data
            .into_iter()
            .map(|b| {
                Ok(RawOrderBook {
                    timestamp: Some(iso_millis(&b.timestamp)?),
                    asks: b.asks.iter().map(|[p, q]| (*p, *q)).collect(),
                    bids: b.bids.iter().map(|[p, q]| (*p, *q)).collect(),
                    unit: QuantityUnit::Contracts,
                    snapshot: true,
                    seq_id: None,
                    prev_seq_id: None,
                    symbol: b.symbol,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        normalize::topk_books(Self::EXCHANGE, market_type, raws, BOOK10_DEPTH, received_at, msg)
    }

    fn parse_bbo(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<BboMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Bbo, MARKETS)?;
        let push: BitmexPush<BitmexQuote> = parse_push(msg, MessageType::Bbo)?;
        let raws = push
            .data
            .into_iter()
            .map(|q| {
                Ok(RawBbo {
                    timestamp: Some(iso_millis(&q.timestamp)?),
                    ask: (q.ask_price.unwrap_or(0.0), q.ask_size.unwrap_or(0.0)),
                    bid: (q.bid_price.unwrap_or(0.0), q.bid_size.unwrap_or(0.0)),
                    unit: QuantityUnit::Contracts,
                    id: None,
                    symbol: q.symbol,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        normalize::bbos(Self::EXCHANGE, market_type, raws, received_at, msg)
    }

    fn parse_candlestick(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<KlineMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Candlestick, MARKETS)?;
        let push: BitmexPush<BitmexTradeBin> = parse_push(msg, MessageType::Candlestick)?;
        let code = push.table.trim_start_matches("tradeBin");
        let period_ms = canonical_period(Self::EXCHANGE, code)
            .and_then(period_seconds)
            .map(|secs| secs * 1000)
            .ok_or_else(|| ParseError::malformed(format!("unknown bin size '{code}'")))?;
        let raws = push
            .data
            .into_iter()
            .map(|bin| {
                let end = iso_millis(&bin.timestamp)?;
                Ok(RawKline {
                    period: code.to_string(),
                    timestamp: Some(end),
                    begin_time_ms: end.saturating_sub(period_ms),
                    open: bin.open,
                    high: bin.high,
                    low: bin.low,
                    close: bin.close,
                    volume: bin.home_notional,
                    quote_volume: Some(bin.foreign_notional),
                    symbol: bin.symbol,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        normalize::klines(Self::EXCHANGE, market_type, raws, received_at, msg)
    }

    fn parse_funding_rate(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<FundingRateMsg>> {
        require_market(
            Self::EXCHANGE,
            market_type,
            MessageType::FundingRate,
            &[MarketType::InverseSwap, MarketType::QuantoSwap],
        )?;
        let push: BitmexPush<BitmexFunding> = parse_push(msg, MessageType::FundingRate)?;
        let raws = push
            .data
            .into_iter()
            .map(|f| {
                let funding_time = iso_millis(&f.timestamp)?;
                Ok(RawFundingRate {
                    timestamp: Some(funding_time),
                    funding_rate: f.funding_rate,
                    funding_time,
                    estimated_rate: None,
                    symbol: f.symbol,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        normalize::funding_rates(Self::EXCHANGE, market_type, raws, received_at, msg)
    }

    fn parse_open_interest(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OpenInterestMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::OpenInterest, MARKETS)?;
        let push: BitmexPush<BitmexInstrument> = parse_push(msg, MessageType::Ticker)?;
        let raws = push
            .data
            .into_iter()
            .filter_map(|i| i.open_interest.map(|oi| (i.symbol, oi, i.timestamp)))
            .map(|(symbol, open_interest, ts)| {
                Ok(RawOpenInterest {
                    symbol,
                    timestamp: ts.as_deref().map(iso_millis).transpose()?,
                    open_interest,
                    unit: OpenInterestUnit::Contract,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        normalize::open_interests(Self::EXCHANGE, market_type, raws, received_at, msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_type() {
        assert_eq!(table_type("orderBookL2_25"), MessageType::L2Event);
        assert_eq!(table_type("tradeBin1m"), MessageType::Candlestick);
        assert_eq!(table_type("liquidation"), MessageType::Other);
    }

    #[test]
    fn test_group_l2_rows_by_symbol() {
        let rows: Vec<BitmexL2Row> = serde_json::from_str(
            r#"[{"symbol":"XBTUSD","side":"Sell","size":100,"price":56990.5,"timestamp":"2021-03-12T02:13:42.520Z"},
                {"symbol":"ETHUSD","side":"Buy","size":5,"price":1800.0,"timestamp":"2021-03-12T02:13:42.521Z"},
                {"symbol":"XBTUSD","side":"Buy","price":56980.0}]"#,
        )
        .unwrap();
        let books = group_l2_rows(rows, false).unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].symbol, "XBTUSD");
        assert_eq!(books[0].asks, vec![(56990.5, 100.0)]);
        assert_eq!(books[0].bids, vec![(56980.0, 0.0)]);
        assert_eq!(books[0].timestamp, Some(1615515222520));
        assert_eq!(books[1].bids.len(), 1);
    }

    #[test]
    fn test_index_tick_side_and_id() {
        assert_eq!(tick_side(Some("ZeroMinusTick")), "Sell");
        assert_eq!(tick_side(Some("PlusTick")), "Buy");
        assert_eq!(tick_side(None), "Buy");
        assert_eq!(match_id(Some("00000000-0000-0000-0000-000000000000".into())), None);
        assert_eq!(match_id(Some("a5c5fd5c".into())).as_deref(), Some("a5c5fd5c"));
    }

    #[test]
    fn test_index_ticks_reject_tradable_symbols() {
        let msg = r#"{"table":"trade","action":"insert","data":[{"timestamp":"2021-03-12T02:13:42.520Z","symbol":"XBTUSD","side":"Buy","size":100,"price":56990.5,"trdMatchID":"a5c5fd5c"}]}"#;
        assert!(index_ticks(msg, MessageType::Trade).unwrap_err().is_soft());
    }

    #[test]
    fn test_row_without_price_is_malformed() {
        let rows: Vec<BitmexL2Row> =
            serde_json::from_str(r#"[{"symbol":"XBTUSD","side":"Sell"}]"#).unwrap();
        assert!(group_l2_rows(rows, false).unwrap_err().is_soft());
    }
}
