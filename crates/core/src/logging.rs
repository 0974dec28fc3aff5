//! Logging and tracing initialization.
//!
//! Provides [`init_tracing`] to configure structured logging with two modes:
//! - **JSON mode** (`json = true`): machine-readable output with nanosecond
//!   timestamps, suitable for log aggregation when normalizing captures in
//!   batch jobs.
//! - **Pretty mode** (`json = false`): human-readable colored output for
//!   interactive use.
//!
//! Both modes respect the `RUST_LOG` environment variable for filtering
//! (e.g., `RUST_LOG=cmp_parser=debug`).
//!
//! Raw exchange messages can be large (full order book snapshots run to
//! hundreds of kilobytes), so log sites should pass them through
//! [`preview`] rather than logging them whole.

use std::fmt;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Maximum number of bytes of a raw message included in a log line.
pub const PREVIEW_LEN: usize = 160;

/// Initialize the global tracing subscriber.
///
/// Logs go to stderr so that stdout stays reserved for parse results.
///
/// # Panics
///
/// Panics if the global subscriber has already been set.
pub fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_timer(NanosecondTimer)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE);

        registry.with(json_layer).init();
    } else {
        let pretty_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false);

        registry.with(pretty_layer).init();
    }
}

/// Custom timer that emits nanosecond-precision timestamps for JSON logs.
#[derive(Debug, Clone)]
struct NanosecondTimer;

impl tracing_subscriber::fmt::time::FormatTime for NanosecondTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let now = chrono::Utc::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.9fZ"))
    }
}

/// Shorten a raw message for logging.
///
/// Returns at most [`PREVIEW_LEN`] bytes, cut on a UTF-8 character boundary.
pub fn preview(raw: &str) -> &str {
    if raw.len() <= PREVIEW_LEN {
        return raw;
    }
    let mut end = PREVIEW_LEN;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_message_unchanged() {
        let msg = r#"{"e":"aggTrade"}"#;
        assert_eq!(preview(msg), msg);
    }

    #[test]
    fn test_preview_truncates_long_message() {
        let msg = "x".repeat(PREVIEW_LEN * 3);
        assert_eq!(preview(&msg).len(), PREVIEW_LEN);
    }

    #[test]
    fn test_preview_respects_char_boundary() {
        // 'é' is two bytes; an odd offset lands inside it.
        let msg = format!("a{}", "é".repeat(PREVIEW_LEN));
        let p = preview(&msg);
        assert!(p.len() <= PREVIEW_LEN);
        assert!(msg.starts_with(p));
    }
}
