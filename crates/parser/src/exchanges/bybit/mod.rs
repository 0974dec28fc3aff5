//! Bybit v5 spot, linear and inverse matchers.

pub mod types;

use cmp_core::types::{
    BboMsg, Exchange, FundingRateMsg, KlineMsg, MarketType, MessageType, OpenInterestMsg,
    OpenInterestUnit, OrderBookMsg, TradeMsg,
};

use self::types::{BybitKline, BybitOrderbook, BybitTicker, BybitTrade, BybitWsMessage};
use super::{
    items, levels, require_market, single_symbol, ExchangeParser, FUTURES, SPOT_AND_FUTURES, SWAPS,
};
use crate::error::{ParseError, Result};
use crate::fields::{str_f64, str_millis};
use crate::normalize::{
    self, QuantityUnit, RawBbo, RawFundingRate, RawKline, RawOpenInterest, RawOrderBook, RawTrade,
    SideCue,
};

pub(crate) struct BybitParser;

fn quantity_unit(market_type: MarketType) -> QuantityUnit {
    if market_type == MarketType::Spot {
        QuantityUnit::Base
    } else {
        QuantityUnit::Contracts
    }
}

fn parse_ws(msg: &str) -> Result<BybitWsMessage> {
    Ok(serde_json::from_str(msg)?)
}

fn topic_type(ws: &BybitWsMessage) -> MessageType {
    match ws.channel() {
        "publicTrade" => MessageType::Trade,
        "orderbook" if ws.book_depth() == Some(1) => MessageType::Bbo,
        "orderbook" => MessageType::L2Event,
        "kline" => MessageType::Candlestick,
        "tickers" => MessageType::Ticker,
        _ => MessageType::Other,
    }
}

/// Parse `msg` and check that its topic belongs to `channel`.
fn parse_channel(msg: &str, channel: &str) -> Result<BybitWsMessage> {
    let ws = parse_ws(msg)?;
    if ws.channel() == channel {
        Ok(ws)
    } else {
        Err(ParseError::malformed(format!(
            "topic {} is not a {channel} topic",
            ws.topic
        )))
    }
}

fn raw_book(ws: BybitWsMessage, unit: QuantityUnit) -> Result<RawOrderBook> {
    let snapshot = ws.is_snapshot();
    let ob: BybitOrderbook = serde_json::from_value(ws.data)?;
    Ok(RawOrderBook {
        timestamp: ws.ts,
        asks: levels(&ob.a, "a")?,
        bids: levels(&ob.b, "b")?,
        unit,
        snapshot,
        seq_id: Some(ob.u),
        prev_seq_id: None,
        symbol: ob.s,
    })
}

/// Derivative ticker payload with the push time.
fn derivative_ticker(msg: &str) -> Result<(BybitTicker, Option<u64>)> {
    let ws = parse_channel(msg, "tickers")?;
    let ts = ws.ts;
    Ok((serde_json::from_value(ws.data)?, ts))
}

impl ExchangeParser for BybitParser {
    const EXCHANGE: Exchange = Exchange::Bybit;

    fn msg_type(&self, msg: &str) -> MessageType {
        parse_ws(msg).map_or(MessageType::Other, |ws| topic_type(&ws))
    }

    fn extract_symbol(&self, _market_type: MarketType, msg: &str) -> Result<String> {
        let ws = parse_ws(msg)?;
        if ws.channel() == "publicTrade" {
            let trades: Vec<BybitTrade> = items(ws.data)?;
            return single_symbol(trades.iter().map(|t| t.s.as_str()));
        }
        Ok(ws.topic_symbol().to_string())
    }

    fn extract_timestamp(&self, _market_type: MarketType, msg: &str) -> Result<Option<u64>> {
        let ws = parse_ws(msg)?;
        let ts = ws.ts;
        if ws.channel() == "publicTrade" {
            let trades: Vec<BybitTrade> = items(ws.data)?;
            if let Some(max) = trades.iter().map(|t| t.timestamp).max() {
                return Ok(Some(max));
            }
        }
        Ok(ts)
    }

    fn parse_trade(&self, market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Trade, SPOT_AND_FUTURES)?;
        let ws = parse_channel(msg, "publicTrade")?;
        let unit = quantity_unit(market_type);
        let raws = items::<BybitTrade>(ws.data)?
            .into_iter()
            .map(|t| {
                Ok(RawTrade {
                    timestamp: t.timestamp,
                    price: str_f64(&t.p, "p")?,
                    quantity: str_f64(&t.v, "v")?,
                    unit,
                    side: SideCue::Taker(t.side),
                    trade_id: Some(t.i),
                    symbol: t.s,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        normalize::trades(Self::EXCHANGE, market_type, raws, msg)
    }

    fn parse_l2(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OrderBookMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::L2Event, SPOT_AND_FUTURES)?;
        let ws = parse_channel(msg, "orderbook")?;
        if ws.book_depth() == Some(1) {
            return Err(ParseError::malformed("orderbook.1 is a best bid/offer topic"));
        }
        let raw = raw_book(ws, quantity_unit(market_type))?;
        normalize::l2_books(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }

    fn parse_l2_topk(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OrderBookMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::L2TopK, SPOT_AND_FUTURES)?;
        let ws = parse_channel(msg, "orderbook")?;
        // Only the depth-1 topic is pushed as a full snapshot every time.
        if ws.book_depth() != Some(1) {
            return Err(ParseError::malformed(format!(
                "{} is not a top-of-book topic",
                ws.topic
            )));
        }
        let raw = raw_book(ws, quantity_unit(market_type))?;
        normalize::topk_books(Self::EXCHANGE, market_type, vec![raw], 1, received_at, msg)
    }

    fn parse_bbo(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<BboMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Bbo, SPOT_AND_FUTURES)?;
        let ws = parse_channel(msg, "orderbook")?;
        if ws.book_depth() != Some(1) {
            return Err(ParseError::malformed(format!("{} is not a bbo topic", ws.topic)));
        }
        let book = raw_book(ws, quantity_unit(market_type))?;
        let (Some(&ask), Some(&bid)) = (book.asks.first(), book.bids.first()) else {
            return Err(ParseError::malformed("bbo update is missing a side"));
        };
        let raw = RawBbo {
            symbol: book.symbol,
            timestamp: book.timestamp,
            ask,
            bid,
            unit: book.unit,
            id: book.seq_id,
        };
        normalize::bbos(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }

    fn parse_candlestick(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<KlineMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Candlestick, SPOT_AND_FUTURES)?;
        let ws = parse_channel(msg, "kline")?;
        let symbol = ws.topic_symbol().to_string();
        let ts = ws.ts;
        let raws = items::<BybitKline>(ws.data)?
            .into_iter()
            .map(|k| {
                let volume = str_f64(&k.volume, "volume")?;
                let turnover = str_f64(&k.turnover, "turnover")?;
                // Inverse volume is counted in USD and turnover in coin.
                let (volume, quote_volume) = if market_type.is_inverse() {
                    (turnover, volume)
                } else {
                    (volume, turnover)
                };
                Ok(RawKline {
                    symbol: symbol.clone(),
                    timestamp: k.timestamp.or(ts),
                    begin_time_ms: k.start,
                    open: str_f64(&k.open, "open")?,
                    high: str_f64(&k.high, "high")?,
                    low: str_f64(&k.low, "low")?,
                    close: str_f64(&k.close, "close")?,
                    volume,
                    quote_volume: Some(quote_volume),
                    period: k.interval,
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
        require_market(Self::EXCHANGE, market_type, MessageType::FundingRate, SWAPS)?;
        let (ticker, ts) = derivative_ticker(msg)?;
        // Deltas that did not touch the rate carry nothing to report.
        let (Some(rate), Some(next)) = (&ticker.funding_rate, &ticker.next_funding_time) else {
            return Ok(Vec::new());
        };
        let raw = RawFundingRate {
            timestamp: ts,
            funding_rate: str_f64(rate, "fundingRate")?,
            funding_time: str_millis(next)?,
            estimated_rate: None,
            symbol: ticker.symbol,
        };
        normalize::funding_rates(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }

    fn parse_open_interest(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OpenInterestMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::OpenInterest, FUTURES)?;
        let (ticker, ts) = derivative_ticker(msg)?;
        let Some(oi) = &ticker.open_interest else {
            return Ok(Vec::new());
        };
        let raw = RawOpenInterest {
            timestamp: ts,
            open_interest: str_f64(oi, "openInterest")?,
            unit: if market_type.is_inverse() {
                OpenInterestUnit::Contract
            } else {
                OpenInterestUnit::Base
            },
            symbol: ticker.symbol,
        };
        normalize::open_interests(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }
}
