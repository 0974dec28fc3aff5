//! cmp-parse: normalize captured exchange messages into canonical records.
//!
//! Reads one raw exchange message per line from a file (plain or `.gz`) or
//! stdin, runs the configured engine operation on each line and writes one
//! JSON result per input line to stdout. Logs go to stderr.
//!
//! Usage:
//!   cmp-parse --exchange okx --market-type linear_swap --operation trade capture.jsonl.gz
//!   cat messages.txt | cmp-parse --config cmp.toml

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use flate2::read::GzDecoder;
use serde_json::Value;

use cmp_core::config::{AppConfig, Operation};
use cmp_core::types::MarketType;

#[derive(Parser, Debug)]
#[command(name = "cmp-parse", about = "Normalize exchange market data messages")]
struct Args {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Exchange identifier, overrides `input.exchange`.
    #[arg(long)]
    exchange: Option<String>,

    /// Market type, overrides `input.market_type`.
    #[arg(long)]
    market_type: Option<MarketType>,

    /// Engine operation, overrides `input.operation`.
    #[arg(long)]
    operation: Option<Operation>,

    /// Receive time in milliseconds passed to every message.
    #[arg(long)]
    received_at: Option<u64>,

    /// Pretty-print results.
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Input file; `.gz` files are decompressed. Reads stdin when omitted.
    input: Option<PathBuf>,
}

/// Per-run counters.
#[derive(Debug, Default, PartialEq, Eq)]
struct Stats {
    lines: usize,
    records: usize,
    empty: usize,
    failed: usize,
}

fn apply_overrides(cfg: &mut AppConfig, args: &Args) -> Result<()> {
    if let Some(exchange) = &args.exchange {
        cfg.input.exchange = exchange.clone();
    }
    if let Some(market_type) = args.market_type {
        cfg.input.market_type = market_type;
    }
    if let Some(operation) = args.operation {
        cfg.input.operation = operation;
    }
    if args.pretty {
        cfg.output.pretty = true;
    }
    cfg.validate().context("invalid command-line overrides")
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    let Some(path) = path else {
        return Ok(Box::new(BufReader::new(io::stdin())));
    };
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn to_value<T: serde::Serialize>(records: Vec<T>) -> Result<(Value, usize)> {
    let n = records.len();
    Ok((serde_json::to_value(records)?, n))
}

/// Run the configured operation on one message.
///
/// Returns the JSON result and the number of records it holds.
fn parse_line(cfg: &AppConfig, msg: &str, received_at: Option<u64>) -> Result<(Value, usize)> {
    let exchange = cfg.input.exchange.as_str();
    let market_type = cfg.input.market_type;
    match cfg.input.operation {
        Operation::Trade => to_value(cmp_parser::parse_trade(exchange, market_type, msg)?),
        Operation::L2 => to_value(cmp_parser::parse_l2(exchange, market_type, msg, received_at)?),
        Operation::L2Topk => {
            to_value(cmp_parser::parse_l2_topk(exchange, market_type, msg, received_at)?)
        }
        Operation::Bbo => to_value(cmp_parser::parse_bbo(exchange, market_type, msg, received_at)?),
        Operation::Candlestick => {
            to_value(cmp_parser::parse_candlestick(exchange, market_type, msg, received_at)?)
        }
        Operation::FundingRate => {
            to_value(cmp_parser::parse_funding_rate(exchange, market_type, msg, received_at)?)
        }
        Operation::OpenInterest => {
            to_value(cmp_parser::parse_open_interest(exchange, market_type, msg, received_at)?)
        }
        Operation::MsgType => {
            let msg_type = cmp_parser::get_msg_type(exchange, msg);
            Ok((Value::String(msg_type.as_str().to_string()), 1))
        }
        Operation::Symbol => {
            let symbol = cmp_parser::extract_symbol(exchange, market_type, msg);
            let n = usize::from(symbol.is_some());
            Ok((serde_json::to_value(symbol)?, n))
        }
        Operation::Timestamp => {
            let ts = cmp_parser::extract_timestamp(exchange, market_type, msg, received_at)?;
            let n = usize::from(ts.is_some());
            Ok((serde_json::to_value(ts)?, n))
        }
    }
}

/// Parse every non-blank line of `reader`, writing one result per line.
///
/// Lines that fail with a hard error are logged and written as `null`.
fn run<R: BufRead, W: Write>(
    cfg: &AppConfig,
    received_at: Option<u64>,
    reader: R,
    mut writer: W,
) -> Result<Stats> {
    let mut stats = Stats::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let msg = line.trim();
        if msg.is_empty() {
            continue;
        }
        stats.lines += 1;

        let value = match parse_line(cfg, msg, received_at) {
            Ok((value, 0)) => {
                stats.empty += 1;
                value
            }
            Ok((value, n)) => {
                stats.records += n;
                value
            }
            Err(e) => {
                stats.failed += 1;
                tracing::error!(line = idx + 1, error = %e, "failed to parse message");
                Value::Null
            }
        };

        if cfg.output.pretty {
            serde_json::to_writer_pretty(&mut writer, &value)?;
        } else {
            serde_json::to_writer(&mut writer, &value)?;
        }
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(stats)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg = AppConfig::load(args.config.clone())?;
    apply_overrides(&mut cfg, &args)?;

    cmp_core::logging::init_tracing(cfg.logging.json);

    let received_at = args.received_at.or_else(|| {
        cfg.input
            .stamp_received_at
            .then(|| chrono::Utc::now().timestamp_millis())
            .and_then(|ms| u64::try_from(ms).ok())
    });

    tracing::info!(
        exchange = %cfg.input.exchange,
        market_type = %cfg.input.market_type,
        operation = %cfg.input.operation,
        input = ?args.input,
        "starting cmp-parse"
    );

    let reader = open_input(args.input.as_deref())?;
    let stdout = io::stdout();
    let stats = run(&cfg, received_at, reader, BufWriter::new(stdout.lock()))?;

    tracing::info!(
        lines = stats.lines,
        records = stats.records,
        empty = stats.empty,
        failed = stats.failed,
        "done"
    );
    Ok(())
}
