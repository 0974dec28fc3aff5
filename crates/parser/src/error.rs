//! Errors produced while matching and normalizing messages.

use cmp_core::types::{Exchange, MarketType, MessageType};

/// Errors that can occur while parsing a raw exchange message.
///
/// The facade treats [`UnsupportedCombination`](ParseError::UnsupportedCombination)
/// and [`MalformedMessage`](ParseError::MalformedMessage) as soft failures
/// (an empty result); the other two variants are returned to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// No matcher exists for this exchange, market type and category.
    #[error("{exchange} {market_type} has no {msg_type} parser")]
    UnsupportedCombination {
        exchange: String,
        market_type: MarketType,
        msg_type: MessageType,
    },
    /// The message does not have the shape the matcher expects.
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    /// No contract size is known for a contract-denominated symbol.
    #[error("no contract spec for {exchange} {market_type} {symbol}")]
    UnknownContractSpec {
        exchange: Exchange,
        market_type: MarketType,
        symbol: String,
    },
    /// A timestamp field is present but not a valid number or date.
    #[error("unparsable timestamp: {0}")]
    TimestampParse(String),
}

impl ParseError {
    pub(crate) fn unsupported(
        exchange: impl Into<String>,
        market_type: MarketType,
        msg_type: MessageType,
    ) -> Self {
        ParseError::UnsupportedCombination {
            exchange: exchange.into(),
            market_type,
            msg_type,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        ParseError::MalformedMessage(msg.into())
    }

    /// `true` for failures the facade reports as an empty result.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            ParseError::UnsupportedCombination { .. } | ParseError::MalformedMessage(_)
        )
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::MalformedMessage(err.to_string())
    }
}

/// Result alias used throughout the parser.
pub type Result<T> = std::result::Result<T, ParseError>;
