//! Deribit futures, perpetual and option matchers.

pub mod types;

use cmp_core::types::{
    BboMsg, Exchange, FundingRateMsg, KlineMsg, MarketType, MessageType, OpenInterestMsg,
    OpenInterestUnit, OrderBookMsg, TradeMsg,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use self::types::{
    DeribitBook, DeribitChart, DeribitItemHeader, DeribitNotification, DeribitQuote,
    DeribitTicker, DeribitTrade,
};
use super::{items, require_market, single_symbol, ExchangeParser, SWAPS};
use crate::error::{ParseError, Result};
use crate::fields::{level_pair, max_millis, value_millis};
use crate::normalize::{
    self, QuantityUnit, RawBbo, RawFundingRate, RawKline, RawOpenInterest, RawOrderBook, RawTrade,
    SideCue,
};

pub(crate) struct DeribitParser;

const MARKETS: &[MarketType] = &[
    MarketType::InverseFuture,
    MarketType::InverseSwap,
    MarketType::LinearSwap,
    MarketType::EuropeanOption,
];

/// Funding accrues continuously but is quoted per eight hours.
const FUNDING_PERIOD_MS: u64 = 8 * 3_600 * 1_000;

/// Inverse amounts are USD; options and USDC perpetuals count base coin.
fn quantity_unit(market_type: MarketType) -> QuantityUnit {
    if market_type.is_inverse() {
        QuantityUnit::Quote
    } else {
        QuantityUnit::Base
    }
}

fn channel_type(parts: &[&str]) -> MessageType {
    match parts.first().copied() {
        Some("trades") => MessageType::Trade,
        Some("book") if parts.len() == 5 => MessageType::L2TopK,
        Some("book") => MessageType::L2Event,
        Some("quote") => MessageType::Bbo,
        Some("chart") => MessageType::Candlestick,
        Some("ticker") => MessageType::Ticker,
        _ => MessageType::Other,
    }
}

fn parse_notification<T: DeserializeOwned>(
    msg: &str,
    expected: MessageType,
) -> Result<DeribitNotification<T>> {
    let n: DeribitNotification<T> = serde_json::from_str(msg)?;
    if channel_type(&n.channel_parts()) == expected {
        Ok(n)
    } else {
        Err(ParseError::malformed(format!(
            "channel {} is not a {expected} channel",
            n.params.channel
        )))
    }
}

/// Raw book levels lead with an action string; grouped levels do not.
fn book_levels(raw: &[Vec<Value>], field: &str) -> Result<Vec<(f64, f64)>> {
    raw.iter()
        .map(|level| match level.first() {
            Some(Value::String(_)) => level_pair(&level[1..], field),
            _ => level_pair(level, field),
        })
        .collect()
}

fn raw_book(book: DeribitBook, unit: QuantityUnit) -> Result<RawOrderBook> {
    Ok(RawOrderBook {
        timestamp: Some(book.timestamp),
        asks: book_levels(&book.asks, "asks")?,
        bids: book_levels(&book.bids, "bids")?,
        unit,
        snapshot: book.kind.as_deref() == Some("snapshot"),
        seq_id: Some(book.change_id),
        prev_seq_id: book.prev_change_id,
        symbol: book.instrument_name,
    })
}

/// Next funding boundary at or after `ts`.
fn next_funding_time(ts: u64) -> u64 {
    ts.div_ceil(FUNDING_PERIOD_MS) * FUNDING_PERIOD_MS
}

fn ticker(msg: &str) -> Result<DeribitTicker> {
    let n: DeribitNotification<DeribitTicker> = parse_notification(msg, MessageType::Ticker)?;
    Ok(n.params.data)
}

impl ExchangeParser for DeribitParser {
    const EXCHANGE: Exchange = Exchange::Deribit;

    fn msg_type(&self, msg: &str) -> MessageType {
        serde_json::from_str::<DeribitNotification<Value>>(msg)
            .map_or(MessageType::Other, |n| channel_type(&n.channel_parts()))
    }

    fn extract_symbol(&self, _market_type: MarketType, msg: &str) -> Result<String> {
        let n: DeribitNotification<Value> = serde_json::from_str(msg)?;
        if n.channel_kind() == "chart" {
            // chart.trades.{instrument}.{resolution}
            return n
                .channel_parts()
                .get(2)
                .map(|s| s.to_string())
                .ok_or_else(|| ParseError::malformed("chart channel without instrument"));
        }
        let headers: Vec<DeribitItemHeader> = items(n.params.data)?;
        single_symbol(headers.iter().filter_map(|h| h.instrument_name.as_deref()))
    }

    fn extract_timestamp(&self, _market_type: MarketType, msg: &str) -> Result<Option<u64>> {
        let n: DeribitNotification<Value> = serde_json::from_str(msg)?;
        let headers: Vec<DeribitItemHeader> = items(n.params.data)?;
        headers.iter().try_fold(None, |acc, h| -> Result<Option<u64>> {
            let ts = match h.timestamp.as_ref().or(h.tick.as_ref()) {
                Some(v) => value_millis(v)?,
                None => None,
            };
            Ok(max_millis(acc, ts))
        })
    }

    fn parse_trade(&self, market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Trade, MARKETS)?;
        let n: DeribitNotification<Vec<DeribitTrade>> =
            parse_notification(msg, MessageType::Trade)?;
        let unit = quantity_unit(market_type);
        let raws = n
            .params
            .data
            .into_iter()
            .map(|t| RawTrade {
                symbol: t.instrument_name,
                timestamp: t.timestamp,
                price: t.price,
                quantity: t.amount,
                unit,
                side: SideCue::Taker(t.direction),
                trade_id: Some(t.trade_id),
            })
            .collect();
        normalize::trades(Self::EXCHANGE, market_type, raws, msg)
    }

    fn parse_l2(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OrderBookMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::L2Event, MARKETS)?;
        let n: DeribitNotification<DeribitBook> = parse_notification(msg, MessageType::L2Event)?;
        let raw = raw_book(n.params.data, quantity_unit(market_type))?;
        normalize::l2_books(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }

    fn parse_l2_topk(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OrderBookMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::L2TopK, MARKETS)?;
        let n: DeribitNotification<DeribitBook> = parse_notification(msg, MessageType::L2TopK)?;
        // book.{instrument}.{group}.{depth}.{interval}
        let depth = n.channel_parts()[3]
            .parse::<usize>()
            .map_err(|_| ParseError::malformed(format!("bad depth in {}", n.params.channel)))?;
        let raw = raw_book(n.params.data, quantity_unit(market_type))?;
        normalize::topk_books(Self::EXCHANGE, market_type, vec![raw], depth, received_at, msg)
    }

    fn parse_bbo(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<BboMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Bbo, MARKETS)?;
        let n: DeribitNotification<DeribitQuote> = parse_notification(msg, MessageType::Bbo)?;
        let q = n.params.data;
        let raw = RawBbo {
            symbol: q.instrument_name,
            timestamp: Some(q.timestamp),
            ask: (q.best_ask_price.unwrap_or(0.0), q.best_ask_amount.unwrap_or(0.0)),
            bid: (q.best_bid_price.unwrap_or(0.0), q.best_bid_amount.unwrap_or(0.0)),
            unit: quantity_unit(market_type),
            id: None,
        };
        normalize::bbos(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }

    fn parse_candlestick(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<KlineMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Candlestick, MARKETS)?;
        let n: DeribitNotification<DeribitChart> =
            parse_notification(msg, MessageType::Candlestick)?;
        let (symbol, resolution) = match n.channel_parts().as_slice() {
            ["chart", "trades", symbol, resolution] => (symbol.to_string(), resolution.to_string()),
            _ => {
                return Err(ParseError::malformed(format!(
                    "unexpected chart channel {}",
                    n.params.channel
                )));
            }
        };
        let c = n.params.data;
        let raw = RawKline {
            symbol,
            timestamp: Some(c.tick),
            period: resolution,
            begin_time_ms: c.tick,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
            quote_volume: Some(c.cost),
        };
        normalize::klines(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }

    fn parse_funding_rate(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<FundingRateMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::FundingRate, SWAPS)?;
        let t = ticker(msg)?;
        let Some(funding_8h) = t.funding_8h else {
            return Ok(Vec::new());
        };
        let raw = RawFundingRate {
            timestamp: Some(t.timestamp),
            funding_rate: funding_8h,
            funding_time: next_funding_time(t.timestamp),
            estimated_rate: t.current_funding,
            symbol: t.instrument_name,
        };
        normalize::funding_rates(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }

    fn parse_open_interest(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OpenInterestMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::OpenInterest, MARKETS)?;
        let t = ticker(msg)?;
        let raw = RawOpenInterest {
            timestamp: Some(t.timestamp),
            open_interest: t.open_interest,
            unit: if market_type.is_inverse() {
                OpenInterestUnit::Quote
            } else {
                OpenInterestUnit::Base
            },
            symbol: t.instrument_name,
        };
        normalize::open_interests(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }
}
