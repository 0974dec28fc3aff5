//! Small helpers for retyping venue fields.
//!
//! Exchanges encode numbers as JSON numbers, decimal strings, or both within
//! one feed, and timestamps as integers, integer strings or ISO-8601 text.
//! Matchers use these helpers so that a bad field always surfaces as a
//! [`ParseError`] rather than a silent zero.

use chrono::DateTime;
use serde_json::Value;

use crate::error::{ParseError, Result};

/// Parse a decimal string.
pub(crate) fn str_f64(s: &str, field: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| ParseError::malformed(format!("{field}: '{s}' is not a number")))
}

/// Parse a JSON number or a decimal string.
pub(crate) fn value_f64(v: &Value, field: &str) -> Result<f64> {
    match v {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ParseError::malformed(format!("{field}: {n} out of range"))),
        Value::String(s) => str_f64(s, field),
        Value::Null => Err(ParseError::malformed(format!("{field} is missing"))),
        other => Err(ParseError::malformed(format!("{field}: unexpected {other}"))),
    }
}

/// Parse a `[price, quantity, ...]` level whose first two entries are
/// numbers or decimal strings.
pub(crate) fn level_pair(level: &[Value], field: &str) -> Result<(f64, f64)> {
    match level {
        [price, qty, ..] => Ok((value_f64(price, field)?, value_f64(qty, field)?)),
        _ => Err(ParseError::malformed(format!("{field}: level has fewer than 2 entries"))),
    }
}

/// Parse a `[price, quantity, ...]` level of decimal strings.
pub(crate) fn str_level(level: &[String], field: &str) -> Result<(f64, f64)> {
    match level {
        [price, qty, ..] => Ok((str_f64(price, field)?, str_f64(qty, field)?)),
        _ => Err(ParseError::malformed(format!("{field}: level has fewer than 2 entries"))),
    }
}

/// Parse an integer millisecond timestamp from a decimal string.
pub(crate) fn str_millis(s: &str) -> Result<u64> {
    s.trim()
        .parse::<u64>()
        .map_err(|_| ParseError::TimestampParse(s.to_string()))
}

/// Parse an ISO-8601 / RFC 3339 timestamp into epoch milliseconds.
pub(crate) fn iso_millis(s: &str) -> Result<u64> {
    let dt = DateTime::parse_from_rfc3339(s.trim())
        .map_err(|_| ParseError::TimestampParse(s.to_string()))?;
    u64::try_from(dt.timestamp_millis()).map_err(|_| ParseError::TimestampParse(s.to_string()))
}

/// Parse any JSON timestamp representation into epoch milliseconds.
///
/// Accepts integers, integer strings and ISO-8601 strings. `null` means the
/// field is absent and yields `Ok(None)`.
pub(crate) fn value_millis(v: &Value) -> Result<Option<u64>> {
    match v {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(Some)
            .ok_or_else(|| ParseError::TimestampParse(n.to_string())),
        Value::String(s) if s.bytes().all(|b| b.is_ascii_digit()) && !s.is_empty() => {
            str_millis(s).map(Some)
        }
        Value::String(s) => iso_millis(s).map(Some),
        other => Err(ParseError::TimestampParse(other.to_string())),
    }
}

/// Fold an optional timestamp into a running maximum.
pub(crate) fn max_millis(acc: Option<u64>, ts: Option<u64>) -> Option<u64> {
    match (acc, ts) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Resolve an event time, falling back to the caller's receipt time.
pub(crate) fn event_time_or(event: Option<u64>, received_at: Option<u64>) -> Result<u64> {
    event
        .or(received_at)
        .ok_or_else(|| ParseError::malformed("message has no event time and no received_at"))
}
