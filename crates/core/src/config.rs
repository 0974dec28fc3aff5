//! Layered configuration for the `cmp-parse` front end.
//!
//! Configuration is loaded in layers with increasing priority:
//! 1. Compiled-in defaults (Binance spot trades, pretty logs)
//! 2. TOML configuration file (if provided)
//! 3. Environment variable overrides (prefix `CMP_`, nested with `__`)
//!
//! The parser engine itself is configuration-free; everything here selects
//! what the CLI feeds into it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::types::{Exchange, MarketType};

// ── Default value functions ────────────────────────────────────────────

fn default_exchange() -> String {
    "binance".to_string()
}

fn default_market_type() -> MarketType {
    MarketType::Spot
}

fn default_operation() -> Operation {
    Operation::Trade
}

// ── Configuration structs ──────────────────────────────────────────────

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// What to parse and how.
    pub input: InputConfig,
    /// Output formatting.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Log output settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON logs instead of pretty ones.
    #[serde(default)]
    pub json: bool,
}

/// Input selection.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Lowercase exchange identifier, e.g. `binance`.
    #[serde(default = "default_exchange")]
    pub exchange: String,
    /// Market type of every message in the input.
    #[serde(default = "default_market_type")]
    pub market_type: MarketType,
    /// Engine operation applied to each line.
    #[serde(default = "default_operation")]
    pub operation: Operation,
    /// Supply the wall-clock time as `received_at` when no explicit value is
    /// given.
    #[serde(default)]
    pub stamp_received_at: bool,
}

/// Output formatting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print each JSON result.
    #[serde(default)]
    pub pretty: bool,
}

/// Engine operation selected for a run.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Trade,
    L2,
    L2Topk,
    Bbo,
    Candlestick,
    FundingRate,
    OpenInterest,
    MsgType,
    Symbol,
    Timestamp,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::Trade,
        Operation::L2,
        Operation::L2Topk,
        Operation::Bbo,
        Operation::Candlestick,
        Operation::FundingRate,
        Operation::OpenInterest,
        Operation::MsgType,
        Operation::Symbol,
        Operation::Timestamp,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::Trade => "trade",
            Operation::L2 => "l2",
            Operation::L2Topk => "l2_topk",
            Operation::Bbo => "bbo",
            Operation::Candlestick => "candlestick",
            Operation::FundingRate => "funding_rate",
            Operation::OpenInterest => "open_interest",
            Operation::MsgType => "msg_type",
            Operation::Symbol => "symbol",
            Operation::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == lower)
            .ok_or_else(|| format!("unknown operation '{s}'"))
    }
}

impl AppConfig {
    /// Load configuration using layered sources.
    ///
    /// 1. Compiled-in defaults.
    /// 2. TOML file at `config_path` (if `Some`).
    /// 3. Environment variable overrides with prefix `CMP_` and `__` as the
    ///    nesting separator (e.g., `CMP_INPUT__EXCHANGE=okx`).
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder()
            // ── Layer 1: compiled-in defaults ───────────────────────
            .set_default("logging.json", false)?
            .set_default("input.exchange", "binance")?
            .set_default("input.market_type", "spot")?
            .set_default("input.operation", "trade")?
            .set_default("input.stamp_received_at", false)?
            .set_default("output.pretty", false)?;

        // ── Layer 2: TOML file ─────────────────────────────────────
        if let Some(path) = config_path {
            let path_str = path.to_str().context("config path is not valid UTF-8")?;
            builder = builder.add_source(File::with_name(path_str).required(true));
        }

        // ── Layer 3: env var overrides (CMP_ prefix) ──────────────
        // The prefix separator is set explicitly; otherwise the `config`
        // crate reuses the `__` nesting separator for the prefix as well.
        builder = builder.add_source(
            Environment::with_prefix("CMP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let cfg: AppConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// The configured exchange, parsed.
    pub fn exchange(&self) -> Result<Exchange> {
        self.input
            .exchange
            .parse::<Exchange>()
            .map_err(anyhow::Error::msg)
    }

    /// Validate configuration invariants.
    ///
    /// Called by [`AppConfig::load`]; callers that patch fields afterwards
    /// (command-line overrides) call it again.
    pub fn validate(&self) -> Result<()> {
        self.exchange()?;
        if self.input.market_type == MarketType::Unknown
            && self.input.operation != Operation::MsgType
        {
            bail!(
                "market type 'unknown' is only valid with the msg_type operation, got {}",
                self.input.operation
            );
        }
        Ok(())
    }
}
