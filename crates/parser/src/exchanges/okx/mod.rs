//! OKX v5 spot, futures, swap and option matchers.

pub mod types;

use cmp_core::types::{
    BboMsg, Exchange, FundingRateMsg, KlineMsg, MarketType, MessageType, OpenInterestMsg,
    OpenInterestUnit, OrderBookMsg, TradeMsg,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use self::types::{
    OkxDepthData, OkxFundingRate, OkxItemHeader, OkxOpenInterest, OkxPush, OkxTrade,
};
use super::{levels, require_market, single_symbol, ExchangeParser, SWAPS};
use crate::error::{ParseError, Result};
use crate::fields::{max_millis, str_f64, str_millis, value_millis};
use crate::normalize::{
    self, QuantityUnit, RawBbo, RawFundingRate, RawKline, RawOpenInterest, RawOrderBook, RawTrade,
    SideCue,
};

pub(crate) struct OkxParser;

const ALL_MARKETS: &[MarketType] = &[
    MarketType::Spot,
    MarketType::LinearFuture,
    MarketType::InverseFuture,
    MarketType::LinearSwap,
    MarketType::InverseSwap,
    MarketType::EuropeanOption,
];

const DERIVATIVES: &[MarketType] = &[
    MarketType::LinearFuture,
    MarketType::InverseFuture,
    MarketType::LinearSwap,
    MarketType::InverseSwap,
    MarketType::EuropeanOption,
];

/// Depth of the `books5` channel.
const BOOKS5_DEPTH: usize = 5;

fn quantity_unit(market_type: MarketType) -> QuantityUnit {
    if market_type == MarketType::Spot {
        QuantityUnit::Base
    } else {
        QuantityUnit::Contracts
    }
}

fn channel_type(channel: &str) -> MessageType {
    match channel {
        "trades" | "trades-all" => MessageType::Trade,
        "books" | "books-l2-tbt" | "books50-l2-tbt" => MessageType::L2Event,
        "books5" => MessageType::L2TopK,
        "bbo-tbt" => MessageType::Bbo,
        "tickers" => MessageType::Ticker,
        "funding-rate" => MessageType::FundingRate,
        "open-interest" => MessageType::OpenInterest,
        c if c.starts_with("candle") => MessageType::Candlestick,
        _ => MessageType::Other,
    }
}

/// Parse a push whose channel classifies as `expected`.
fn parse_push<T: DeserializeOwned>(msg: &str, expected: MessageType) -> Result<OkxPush<T>> {
    let push: OkxPush<T> = serde_json::from_str(msg)?;
    if channel_type(&push.arg.channel) == expected {
        Ok(push)
    } else {
        Err(ParseError::malformed(format!(
            "channel {} is not a {expected} channel",
            push.arg.channel
        )))
    }
}

/// `-1` and other negative ids mean "no previous update".
fn seq(id: Option<i64>) -> Option<u64> {
    id.and_then(|v| u64::try_from(v).ok())
}

fn raw_book(
    data: OkxDepthData,
    symbol: &str,
    unit: QuantityUnit,
    snapshot: bool,
) -> Result<RawOrderBook> {
    Ok(RawOrderBook {
        symbol: symbol.to_string(),
        timestamp: Some(str_millis(&data.timestamp)?),
        asks: levels(&data.asks, "asks")?,
        bids: levels(&data.bids, "bids")?,
        unit,
        snapshot,
        seq_id: seq(data.seq_id),
        prev_seq_id: seq(data.prev_seq_id),
    })
}

fn push_symbol(arg_inst: Option<String>) -> Result<String> {
    arg_inst.ok_or_else(|| ParseError::malformed("push has no instId"))
}

/// `candle1H` → `1H`.
fn candle_code(channel: &str) -> &str {
    channel.strip_prefix("candle").unwrap_or(channel)
}

impl ExchangeParser for OkxParser {
    const EXCHANGE: Exchange = Exchange::Okx;

    fn msg_type(&self, msg: &str) -> MessageType {
        serde_json::from_str::<OkxPush<Value>>(msg)
            .map_or(MessageType::Other, |push| channel_type(&push.arg.channel))
    }

    fn extract_symbol(&self, _market_type: MarketType, msg: &str) -> Result<String> {
        let push: OkxPush<Value> = serde_json::from_str(msg)?;
        if let Some(inst_id) = push.arg.inst_id {
            return Ok(inst_id);
        }
        let headers = push
            .data
            .into_iter()
            .filter(Value::is_object)
            .map(serde_json::from_value::<OkxItemHeader>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        single_symbol(headers.iter().filter_map(|h| h.inst_id.as_deref()))
    }

    fn extract_timestamp(&self, _market_type: MarketType, msg: &str) -> Result<Option<u64>> {
        let push: OkxPush<Value> = serde_json::from_str(msg)?;
        push.data.iter().try_fold(None, |acc, item| -> Result<Option<u64>> {
            let ts = match item {
                // Candles are rows whose first column is the bar start.
                Value::Array(row) => row.first().map(value_millis).transpose()?.flatten(),
                Value::Object(obj) => obj.get("ts").map(value_millis).transpose()?.flatten(),
                _ => None,
            };
            Ok(max_millis(acc, ts))
        })
    }

    fn parse_trade(&self, market_type: MarketType, msg: &str) -> Result<Vec<TradeMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Trade, ALL_MARKETS)?;
        let push: OkxPush<OkxTrade> = parse_push(msg, MessageType::Trade)?;
        let unit = quantity_unit(market_type);
        let raws = push
            .data
            .into_iter()
            .map(|t| {
                Ok(RawTrade {
                    timestamp: str_millis(&t.ts)?,
                    price: str_f64(&t.px, "px")?,
                    quantity: str_f64(&t.sz, "sz")?,
                    unit,
                    side: SideCue::Taker(t.side),
                    trade_id: Some(t.trade_id),
                    symbol: t.inst_id,
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
        require_market(Self::EXCHANGE, market_type, MessageType::L2Event, ALL_MARKETS)?;
        let push: OkxPush<OkxDepthData> = parse_push(msg, MessageType::L2Event)?;
        let snapshot = push.action.as_deref() == Some("snapshot");
        let symbol = push_symbol(push.arg.inst_id)?;
        let unit = quantity_unit(market_type);
        let raws = push
            .data
            .into_iter()
            .map(|d| raw_book(d, &symbol, unit, snapshot))
            .collect::<Result<Vec<_>>>()?;
        normalize::l2_books(Self::EXCHANGE, market_type, raws, received_at, msg)
    }

    fn parse_l2_topk(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<OrderBookMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::L2TopK, ALL_MARKETS)?;
        let push: OkxPush<OkxDepthData> = parse_push(msg, MessageType::L2TopK)?;
        let symbol = push_symbol(push.arg.inst_id)?;
        let unit = quantity_unit(market_type);
        let raws = push
            .data
            .into_iter()
            .map(|d| raw_book(d, &symbol, unit, true))
            .collect::<Result<Vec<_>>>()?;
        normalize::topk_books(Self::EXCHANGE, market_type, raws, BOOKS5_DEPTH, received_at, msg)
    }

    fn parse_bbo(
        &self,
        market_type: MarketType,
        msg: &str,
        received_at: Option<u64>,
    ) -> Result<Vec<BboMsg>> {
        require_market(Self::EXCHANGE, market_type, MessageType::Bbo, ALL_MARKETS)?;
        let push: OkxPush<OkxDepthData> = parse_push(msg, MessageType::Bbo)?;
        let symbol = push_symbol(push.arg.inst_id)?;
        let unit = quantity_unit(market_type);
        let raws = push
            .data
            .into_iter()
            .map(|d| {
                let book = raw_book(d, &symbol, unit, true)?;
                let (Some(&ask), Some(&bid)) = (book.asks.first(), book.bids.first()) else {
                    return Err(ParseError::malformed("bbo-tbt push is missing a side"));
                };
                Ok(RawBbo {
                    symbol: book.symbol,
                    timestamp: book.timestamp,
                    ask,
                    bid,
                    unit,
                    id: book.seq_id,
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
        require_market(Self::EXCHANGE, market_type, MessageType::Candlestick, ALL_MARKETS)?;
        let push: OkxPush<Vec<String>> = parse_push(msg, MessageType::Candlestick)?;
        let period = candle_code(&push.arg.channel).to_string();
        let symbol = push_symbol(push.arg.inst_id)?;
        let raws = push
            .data
            .into_iter()
            .map(|row| {
                // [ts, o, h, l, c, vol, volCcy, volCcyQuote, confirm]
                if row.len() < 7 {
                    return Err(ParseError::malformed("candle row has fewer than 7 columns"));
                }
                let begin = str_millis(&row[0])?;
                // Spot: vol is base, volCcy quote. Derivatives: vol is
                // contracts, volCcy base, volCcyQuote quote.
                let (volume, quote_volume) = if market_type == MarketType::Spot {
                    (str_f64(&row[5], "vol")?, Some(str_f64(&row[6], "volCcy")?))
                } else {
                    let quote = match row.get(7) {
                        Some(q) if row.len() > 8 => Some(str_f64(q, "volCcyQuote")?),
                        _ => None,
                    };
                    (str_f64(&row[6], "volCcy")?, quote)
                };
                Ok(RawKline {
                    symbol: symbol.clone(),
                    timestamp: Some(begin),
                    period: period.clone(),
                    begin_time_ms: begin,
                    open: str_f64(&row[1], "o")?,
                    high: str_f64(&row[2], "h")?,
                    low: str_f64(&row[3], "l")?,
                    close: str_f64(&row[4], "c")?,
                    volume,
                    quote_volume,
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
        let push: OkxPush<OkxFundingRate> = parse_push(msg, MessageType::FundingRate)?;
        let raws = push
            .data
            .into_iter()
            .map(|f| {
                let estimated_rate = match f.next_funding_rate.as_deref() {
                    None | Some("") => None,
                    Some(r) => Some(str_f64(r, "nextFundingRate")?),
                };
                Ok(RawFundingRate {
                    timestamp: f.ts.as_deref().map(str_millis).transpose()?,
                    funding_rate: str_f64(&f.funding_rate, "fundingRate")?,
                    funding_time: str_millis(&f.funding_time)?,
                    estimated_rate,
                    symbol: f.inst_id,
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
        require_market(Self::EXCHANGE, market_type, MessageType::OpenInterest, DERIVATIVES)?;
        let push: OkxPush<OkxOpenInterest> = parse_push(msg, MessageType::OpenInterest)?;
        let raws = push
            .data
            .into_iter()
            .map(|o| {
                Ok(RawOpenInterest {
                    timestamp: Some(str_millis(&o.ts)?),
                    open_interest: str_f64(&o.oi, "oi")?,
                    unit: OpenInterestUnit::Contract,
                    symbol: o.inst_id,
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
    fn test_channel_type() {
        assert_eq!(channel_type("books-l2-tbt"), MessageType::L2Event);
        assert_eq!(channel_type("books5"), MessageType::L2TopK);
        assert_eq!(channel_type("candle1Dutc"), MessageType::Candlestick);
        assert_eq!(channel_type("mark-price"), MessageType::Other);
    }

    #[test]
    fn test_seq_drops_negative() {
        assert_eq!(seq(Some(-1)), None);
        assert_eq!(seq(Some(42)), Some(42));
        assert_eq!(seq(None), None);
    }

    #[test]
    fn test_candle_code() {
        assert_eq!(candle_code("candle1H"), "1H");
        assert_eq!(candle_code("candle1Dutc"), "1Dutc");
    }

    #[test]
    fn test_extract_timestamp_from_candle_rows() {
        let msg = r#"{"arg":{"channel":"candle1m","instId":"BTC-USDT"},"data":[["1597026383085","8533.02","8553.74","8527.17","8548.26","45247","529.5858061","529.5858061","0"]]}"#;
        assert_eq!(
            OkxParser.extract_timestamp(MarketType::Spot, msg).unwrap(),
            Some(1597026383085)
        );
    }
}
