use cmp_core::types::{Exchange, KlineMsg, MessageType};

use super::Instrument;
use crate::error::{ParseError, Result};
use crate::fields::event_time_or;

/// One candlestick before period mapping.
#[derive(Debug, Clone)]
pub(crate) struct RawKline {
    pub symbol: String,
    pub timestamp: Option<u64>,
    /// Interval exactly as the venue spells it (`1m`, `60`, `1H`, `1Dutc`).
    pub period: String,
    /// Bar open time, milliseconds.
    pub begin_time_ms: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Base-currency volume.
    pub volume: f64,
    pub quote_volume: Option<f64>,
}

/// Canonical periods and their length in seconds.
const PERIODS: &[(&str, u64)] = &[
    ("1m", 60),
    ("3m", 180),
    ("5m", 300),
    ("10m", 600),
    ("15m", 900),
    ("30m", 1_800),
    ("1h", 3_600),
    ("2h", 7_200),
    ("3h", 10_800),
    ("4h", 14_400),
    ("6h", 21_600),
    ("8h", 28_800),
    ("12h", 43_200),
    ("1d", 86_400),
    ("3d", 259_200),
    ("1w", 604_800),
    ("1M", 2_592_000),
    ("3M", 7_776_000),
];

/// Map a venue interval code onto the canonical period name.
pub(crate) fn canonical_period(exchange: Exchange, code: &str) -> Option<&'static str> {
    let canonical = match exchange {
        // Bybit and Deribit count minutes and spell days, weeks and months
        // with a single letter.
        Exchange::Bybit | Exchange::Deribit => match code {
            "D" | "1D" => "1d",
            "W" => "1w",
            "M" => "1M",
            minutes => return minutes_period(minutes),
        },
        // OKX upper-cases hours and longer, with optional UTC-anchored
        // variants (`1Dutc`).
        Exchange::Okx => {
            let code = code.strip_suffix("utc").unwrap_or(code);
            match code.char_indices().last()? {
                (i, 'H') => return lookup(&format!("{}h", &code[..i])),
                (i, 'D') => return lookup(&format!("{}d", &code[..i])),
                (i, 'W') => return lookup(&format!("{}w", &code[..i])),
                _ => code,
            }
        }
        Exchange::Binance | Exchange::Bitmex | Exchange::CoinbasePro => code,
    };
    lookup(canonical)
}

fn minutes_period(code: &str) -> Option<&'static str> {
    let minutes: u64 = code.parse().ok()?;
    PERIODS
        .iter()
        .find(|(_, secs)| *secs == minutes * 60)
        .map(|(name, _)| *name)
}

fn lookup(name: &str) -> Option<&'static str> {
    PERIODS.iter().find(|(p, _)| *p == name).map(|(p, _)| *p)
}

/// Length of a canonical period in seconds.
pub(crate) fn period_seconds(period: &str) -> Option<u64> {
    PERIODS.iter().find(|(p, _)| *p == period).map(|(_, s)| *s)
}

pub(crate) fn normalize(
    raw: RawKline,
    inst: &Instrument,
    received_at: Option<u64>,
    json: &str,
) -> Result<KlineMsg> {
    let period = canonical_period(inst.exchange, &raw.period).ok_or_else(|| {
        ParseError::malformed(format!("unknown candlestick period '{}'", raw.period))
    })?;
    Ok(KlineMsg {
        exchange: inst.exchange,
        market_type: inst.market_type,
        msg_type: MessageType::Candlestick,
        symbol: raw.symbol,
        pair: inst.pair.clone(),
        timestamp: event_time_or(raw.timestamp, received_at)?,
        period: period.to_string(),
        begin_time: raw.begin_time_ms / 1000,
        open: raw.open,
        high: raw.high,
        low: raw.low,
        close: raw.close,
        volume: raw.volume,
        quote_volume: raw.quote_volume,
        json: json.to_string(),
    })
}
