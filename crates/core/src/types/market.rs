//! Market type and message type enumerations.
//!
//! Both are closed sets with stable snake_case string forms; these strings are
//! what appears in serialized records and what the configuration layer and
//! CLI accept.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of market a symbol trades in.
///
/// Selects both the wire schema variant and the unit-conversion rule for a
/// given exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    Unknown,
    Spot,
    LinearFuture,
    InverseFuture,
    LinearSwap,
    InverseSwap,
    AmericanOption,
    EuropeanOption,
    QuantoFuture,
    QuantoSwap,
    Move,
    #[serde(rename = "bvol")]
    Bvol,
}

impl MarketType {
    /// All market types, in declaration order.
    pub const ALL: [MarketType; 12] = [
        MarketType::Unknown,
        MarketType::Spot,
        MarketType::LinearFuture,
        MarketType::InverseFuture,
        MarketType::LinearSwap,
        MarketType::InverseSwap,
        MarketType::AmericanOption,
        MarketType::EuropeanOption,
        MarketType::QuantoFuture,
        MarketType::QuantoSwap,
        MarketType::Move,
        MarketType::Bvol,
    ];

    /// Stable snake_case name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MarketType::Unknown => "unknown",
            MarketType::Spot => "spot",
            MarketType::LinearFuture => "linear_future",
            MarketType::InverseFuture => "inverse_future",
            MarketType::LinearSwap => "linear_swap",
            MarketType::InverseSwap => "inverse_swap",
            MarketType::AmericanOption => "american_option",
            MarketType::EuropeanOption => "european_option",
            MarketType::QuantoFuture => "quanto_future",
            MarketType::QuantoSwap => "quanto_swap",
            MarketType::Move => "move",
            MarketType::Bvol => "bvol",
        }
    }

    /// `true` for inverse futures and swaps.
    pub const fn is_inverse(&self) -> bool {
        matches!(self, MarketType::InverseFuture | MarketType::InverseSwap)
    }

    /// `true` for markets whose quantities are denominated in contracts.
    /// Volatility indices are not tradable and carry no contract size.
    pub const fn is_derivative(&self) -> bool {
        !matches!(self, MarketType::Spot | MarketType::Unknown | MarketType::Bvol)
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        MarketType::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| format!("unknown market type '{s}'"))
    }
}

/// Category of a raw message, determined purely from its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Trade,
    L2Event,
    L2Snapshot,
    #[serde(rename = "l2_topk")]
    L2TopK,
    L3Event,
    L3Snapshot,
    Bbo,
    Ticker,
    Candlestick,
    FundingRate,
    OpenInterest,
    Other,
}

impl MessageType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageType::Trade => "trade",
            MessageType::L2Event => "l2_event",
            MessageType::L2Snapshot => "l2_snapshot",
            MessageType::L2TopK => "l2_topk",
            MessageType::L3Event => "l3_event",
            MessageType::L3Snapshot => "l3_snapshot",
            MessageType::Bbo => "bbo",
            MessageType::Ticker => "ticker",
            MessageType::Candlestick => "candlestick",
            MessageType::FundingRate => "funding_rate",
            MessageType::OpenInterest => "open_interest",
            MessageType::Other => "other",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_type_roundtrip_names() {
        for m in MarketType::ALL {
            assert_eq!(m.as_str().parse::<MarketType>().unwrap(), m);
        }
    }

    #[test]
    fn test_market_type_serde_matches_as_str() {
        for m in MarketType::ALL {
            let json = serde_json::to_string(&m).unwrap();
            assert_eq!(json, format!("\"{}\"", m.as_str()));
        }
    }

    #[test]
    fn test_market_type_parse_is_case_insensitive() {
        assert_eq!("Inverse_Swap".parse::<MarketType>().unwrap(), MarketType::InverseSwap);
        assert!("perpetual".parse::<MarketType>().is_err());
    }

    #[test]
    fn test_inverse_and_derivative_flags() {
        assert!(MarketType::InverseSwap.is_inverse());
        assert!(!MarketType::LinearSwap.is_inverse());
        assert!(!MarketType::Spot.is_derivative());
        assert!(MarketType::EuropeanOption.is_derivative());
        assert!(MarketType::QuantoSwap.is_derivative());
        assert!(!MarketType::Bvol.is_derivative());
    }

    #[test]
    fn test_message_type_serde() {
        assert_eq!(serde_json::to_string(&MessageType::L2TopK).unwrap(), "\"l2_topk\"");
        assert_eq!(serde_json::to_string(&MessageType::L2Event).unwrap(), "\"l2_event\"");
        assert_eq!(format!("{}", MessageType::FundingRate), "funding_rate");
    }
}
