//! Binance spot, USDⓈ-M and COIN-M matchers.
//!
//! WebSocket payloads arrive in the combined-stream envelope; the stream
//! name decides the category. Open interest only exists as a REST
//! response and is matched without an envelope.

pub mod types;

use cmp_core::types::{
    BboMsg, Exchange, FundingRateMsg, KlineMsg, MarketType, MessageType, OpenInterestMsg,
    OpenInterestUnit, OrderBookMsg, TradeMsg,
};
use serde_json::Value;
use tracing::trace;

use self::types::{
    BinanceAggTrade, BinanceBookTicker, BinanceDepthUpdate, BinanceEnvelope, BinanceEventHeader,
    BinanceKlineEvent, BinanceMarkPrice, BinanceOpenInterest, BinancePartialDepth, BinanceTrade,
};
use super::{
    items, levels, require_market, single_symbol, ExchangeParser, FUTURES, SPOT_AND_FUTURES, SWAPS,
};
use crate::error::{ParseError, Result};
use crate::fields::{max_millis, str_f64, value_millis};
use crate::normalize::{
    self, QuantityUnit, RawBbo, RawFundingRate, RawKline, RawOpenInterest, RawOrderBook, RawTrade,
    SideCue,
};

pub(crate) struct BinanceParser;

/// Spot quantities are base units; every derivative quantity is contracts.
fn quantity_unit(market_type: MarketType) -> QuantityUnit {
    if market_type == MarketType::Spot {
        QuantityUnit::Base
    } else {
        QuantityUnit::Contracts
    }
}

fn channel_type(name: &str) -> MessageType {
    match name {
        "aggTrade" | "trade" => MessageType::Trade,
        "depth" => MessageType::L2Event,
        "bookTicker" => MessageType::Bbo,
        "ticker" | "miniTicker" => MessageType::Ticker,
        "markPrice" => MessageType::FundingRate,
        n if n.starts_with("kline_") => MessageType::Candlestick,
        n if topk_depth(n).is_some() => MessageType::L2TopK,
        _ => MessageType::Other,
    }
}

fn event_type(event: &str) -> MessageType {
    match event {
        "aggTrade" | "trade" => MessageType::Trade,
        "depthUpdate" => MessageType::L2Event,
        "bookTicker" => MessageType::Bbo,
        "24hrTicker" | "24hrMiniTicker" => MessageType::Ticker,
        "kline" => MessageType::Candlestick,
        "markPriceUpdate" => MessageType::FundingRate,
        _ => MessageType::Other,
    }
}

/// `depth20` → 20.
fn topk_depth(name: &str) -> Option<usize> {
    name.strip_prefix("depth")
        .filter(|d| !d.is_empty())
        .and_then(|d| d.parse().ok())
}

fn envelope(msg: &str) -> Result<BinanceEnvelope<Value>> {
    Ok(serde_json::from_str(msg)?)
}

fn expect_channel(env: &BinanceEnvelope<Value>, expected: MessageType) -> Result<()> {
    let actual = channel_type(env.channel_name());
    if actual == expected {
        Ok(())
    } else {
        Err(ParseError::malformed(format!(
            "stream {} is not a {expected} stream",
            env.stream
        )))
    }
}

impl ExchangeParser for BinanceParser {
    const EXCHANGE: Exchange = Exchange::Binance;

    fn msg_type(&self, msg: &str) -> MessageType {
        if let Ok(env) = envelope(msg) {
            return channel_type(env.channel_name());
        }
        if serde_json::from_str::<BinanceOpenInterest>(msg).is_ok() {
            return MessageType::OpenInterest;
        }
        match serde_json::from_str::<BinanceEventHeader>(msg) {
            Ok(BinanceEventHeader {
                event_type: Some(e),
                ..
            }) => event_type(&e),
            _ => MessageType::Other,
        }
    }

    fn extract_symbol(&self, _market_type: MarketType, msg: &str) -> Result<String> {
        let Ok(env) = envelope(msg) else {
            let oi: BinanceOpenInterest = serde_json::from_str(msg)?;
            return Ok(oi.symbol);
        };
        let stream_symbol = env.stream_symbol();
        let headers: Vec<BinanceEventHeader> = items(env.data)?;
        let symbols: Vec<&str> = headers.iter().filter_map(|h| h.symbol.as_deref()).collect();
        if symbols.is_empty() {
            // Spot partial depth only names the symbol in the stream.
            return stream_symbol.ok_or_else(|| ParseError::malformed("message carries no symbol"));
        }
        single_symbol(symbols)
    }

    fn extract_timestamp(&self, _market_type: MarketType, msg: &str) -> Result<Option<u64>> {
        let Ok(env) = envelope(msg) else {
            let oi: BinanceOpenInterest = serde_json::from_str(msg)?;
            return Ok(Some(oi.time));
        };
        let headers: Vec<BinanceEventHeader> = items(env.data)?;
        headers.iter().try_fold(None, |acc, h| -> Result<Option<u64>> {
            match &h.event_time {
                Some(v) => Ok(max_millis(acc, value_millis(v)?)),
                None => Ok(acc),
            }
        })
    }

    fn parse_trade(&self, market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Trade, SPOT_AND_FUTURES)?;
        let env = envelope(msg)?;
        let unit = quantity_unit(market_type);
        let raws = match env.channel_name() {
            "aggTrade" => items::<BinanceAggTrade>(env.data)?
                .into_iter()
                .map(|t| {
                    Ok(RawTrade {
                        timestamp: t.trade_time,
                        price: str_f64(&t.price, "p")?,
                        quantity: str_f64(&t.quantity, "q")?,
                        unit,
                        side: SideCue::BuyerIsMaker(t.is_buyer_maker),
                        trade_id: Some(t.agg_trade_id.to_string()),
                        symbol: t.symbol,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            "trade" => items::<BinanceTrade>(env.data)?
                .into_iter()
                .map(|t| {
                    Ok(RawTrade {
                        timestamp: t.trade_time,
                        price: str_f64(&t.price, "p")?,
                        quantity: str_f64(&t.quantity, "q")?,
                        unit,
                        side: SideCue::BuyerIsMaker(t.is_buyer_maker),
                        trade_id: Some(t.trade_id.to_string()),
                        symbol: t.symbol,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(ParseError::malformed(format!("{other} is not a trade stream")));
            }
        };
        normalize::trades(Self::EXCHANGE, market_type, raws, msg)
    }

    fn parse_l2(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OrderBookMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::L2Event, SPOT_AND_FUTURES)?;
        let env = envelope(msg)?;
        expect_channel(&env, MessageType::L2Event)?;
        let update: BinanceDepthUpdate = serde_json::from_value(env.data)?;
        let raw = RawOrderBook {
            timestamp: Some(update.event_time),
            asks: levels(&update.asks, "a")?,
            bids: levels(&update.bids, "b")?,
            unit: quantity_unit(market_type),
            snapshot: false,
            seq_id: Some(update.last_update_id),
            // Spot events chain on `U - 1` instead of carrying `pu`.
            prev_seq_id: update
                .prev_last_update_id
                .or_else(|| update.first_update_id.checked_sub(1)),
            symbol: update.symbol,
        };
        normalize::l2_books(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }

    fn parse_l2_topk(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OrderBookMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::L2TopK, SPOT_AND_FUTURES)?;
        let env = envelope(msg)?;
        let depth = topk_depth(env.channel_name()).ok_or_else(|| {
            ParseError::malformed(format!("stream {} is not a partial depth stream", env.stream))
        })?;
        let unit = quantity_unit(market_type);
        let raw = if market_type == MarketType::Spot {
            let symbol = env
                .stream_symbol()
                .ok_or_else(|| ParseError::malformed("partial depth without a symbol"))?;
            let book: BinancePartialDepth = serde_json::from_value(env.data)?;
            RawOrderBook {
                symbol,
                timestamp: None,
                asks: levels(&book.asks, "asks")?,
                bids: levels(&book.bids, "bids")?,
                unit,
                snapshot: true,
                seq_id: Some(book.last_update_id),
                prev_seq_id: None,
            }
        } else {
            let update: BinanceDepthUpdate = serde_json::from_value(env.data)?;
            RawOrderBook {
                timestamp: Some(update.event_time),
                asks: levels(&update.asks, "a")?,
                bids: levels(&update.bids, "b")?,
                unit,
                snapshot: true,
                seq_id: Some(update.last_update_id),
                prev_seq_id: update.prev_last_update_id,
                symbol: update.symbol,
            }
        };
        normalize::topk_books(Self::EXCHANGE, market_type, vec![raw], depth, received_at, msg)
    }

    fn parse_bbo(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<BboMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Bbo, SPOT_AND_FUTURES)?;
        let env = envelope(msg)?;
        expect_channel(&env, MessageType::Bbo)?;
        let unit = quantity_unit(market_type);
        let raws = items::<BinanceBookTicker>(env.data)?
            .into_iter()
            .map(|t| {
                Ok(RawBbo {
                    timestamp: t.event_time,
                    ask: (str_f64(&t.ask_price, "a")?, str_f64(&t.ask_qty, "A")?),
                    bid: (str_f64(&t.bid_price, "b")?, str_f64(&t.bid_qty, "B")?),
                    unit,
                    id: Some(t.update_id),
                    symbol: t.symbol,
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
        require_market(Self::EXCHANGE, market_type, MessageType::Candlestick, SPOT_AND_FUTURES)?;
        let env = envelope(msg)?;
        expect_channel(&env, MessageType::Candlestick)?;
        let event: BinanceKlineEvent = serde_json::from_value(env.data)?;
        let k = event.kline;
        let raw = RawKline {
            symbol: event.symbol,
            timestamp: Some(event.event_time),
            begin_time_ms: k.start_time,
            open: str_f64(&k.open, "o")?,
            high: str_f64(&k.high, "h")?,
            low: str_f64(&k.low, "l")?,
            close: str_f64(&k.close, "c")?,
            volume: str_f64(&k.volume, "v")?,
            quote_volume: Some(str_f64(&k.quote_volume, "q")?),
            period: k.interval,
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
        let env = envelope(msg)?;
        expect_channel(&env, MessageType::FundingRate)?;
        let raws = items::<BinanceMarkPrice>(env.data)?
            .into_iter()
            .filter(|m| {
                // Delivery contracts share `!markPrice@arr` with an empty rate.
                let has_rate = !m.funding_rate.is_empty();
                if !has_rate {
                    trace!(symbol = %m.symbol, "skipping mark price without funding rate");
                }
                has_rate
            })
            .map(|m| {
                Ok(RawFundingRate {
                    timestamp: Some(m.event_time),
                    funding_rate: str_f64(&m.funding_rate, "r")?,
                    funding_time: m.next_funding_time,
                    estimated_rate: None,
                    symbol: m.symbol,
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
        require_market(Self::EXCHANGE, market_type, MessageType::OpenInterest, FUTURES)?;
        let oi: BinanceOpenInterest = serde_json::from_str(msg)?;
        let raw = RawOpenInterest {
            timestamp: Some(oi.time),
            open_interest: str_f64(&oi.open_interest, "openInterest")?,
            // COIN-M reports contracts, USDⓈ-M reports base units.
            unit: if market_type.is_inverse() {
                OpenInterestUnit::Contract
            } else {
                OpenInterestUnit::Base
            },
            symbol: oi.symbol,
        };
        normalize::open_interests(Self::EXCHANGE, market_type, vec![raw], received_at, msg)
    }
}
