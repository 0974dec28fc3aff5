//! Venue symbol → normalized `BASE/QUOTE` pair.
//!
//! Every venue spells instruments differently: delimited (`BTC-USDT-SWAP`),
//! concatenated (`BTCUSDT`), with expiry codes (`XBTM22`, `BTCUSD_220624`)
//! or as a product name (`BTC-PERPETUAL`). The rules below reduce all of
//! them to the underlying base and quote currencies.

use cmp_core::types::{Exchange, MarketType};

/// Quote currencies recognised at the end of concatenated symbols, longest
/// first so `USDT` wins over `USD`.
const QUOTE_SUFFIXES: &[&str] = &[
    "FDUSD", "USDT", "BUSD", "USDC", "TUSD", "USDP", "USD", "DAI", "BTC", "XBT", "ETH", "BNB",
    "EUR", "GBP", "TRY", "BRL", "AUD", "JPY",
];

/// Futures month codes (CME convention) used by BitMEX and Bybit.
const MONTH_CODES: &[u8] = b"FGHJKMNQUVXZ";

/// Normalize a venue symbol into `BASE/QUOTE`.
///
/// Returns `None` when the symbol does not follow any rule of the venue.
pub fn normalize_pair(exchange: Exchange, market_type: MarketType, symbol: &str) -> Option<String> {
    let (base, quote) = match exchange {
        Exchange::Binance => binance(market_type, symbol)?,
        Exchange::Bybit => bybit(market_type, symbol)?,
        Exchange::Okx | Exchange::CoinbasePro => split_delimited(symbol, '-')?,
        Exchange::Deribit => deribit(symbol)?,
        Exchange::Bitmex => bitmex(market_type, symbol)?,
    };
    Some(format!("{}/{}", canonical_currency(base), canonical_currency(quote)))
}

fn canonical_currency(c: &str) -> String {
    match c {
        "XBT" => "BTC".to_string(),
        other => other.to_ascii_uppercase(),
    }
}

fn split_delimited(symbol: &str, delim: char) -> Option<(&str, &str)> {
    let mut parts = symbol.split(delim);
    let base = parts.next().filter(|s| !s.is_empty())?;
    let quote = parts.next().filter(|s| !s.is_empty())?;
    Some((base, quote))
}

fn split_quote_suffix(symbol: &str) -> Option<(&str, &str)> {
    QUOTE_SUFFIXES.iter().find_map(|quote| {
        symbol
            .strip_suffix(quote)
            .filter(|base| !base.is_empty())
            .map(|base| (base, *quote))
    })
}

/// Split a concatenated symbol, taking `USD` as the quote first on
/// USD-margined inverse and quanto markets so `XBTUSD` is not read as
/// `XB` + `TUSD`.
fn split_usd_first(market_type: MarketType, symbol: &str) -> Option<(&str, &str)> {
    let usd_quoted = market_type.is_inverse()
        || matches!(market_type, MarketType::QuantoFuture | MarketType::QuantoSwap);
    if usd_quoted {
        if let Some(base) = symbol.strip_suffix("USD").filter(|b| !b.is_empty()) {
            return Some((base, "USD"));
        }
    }
    split_quote_suffix(symbol)
}

/// Strip a trailing month code plus two-digit year (`M22`, `Z23`).
fn strip_month_code(symbol: &str) -> Option<&str> {
    let bytes = symbol.as_bytes();
    if bytes.len() < 4 {
        return None;
    }
    let (root, code) = bytes.split_at(bytes.len() - 3);
    if MONTH_CODES.contains(&code[0]) && code[1].is_ascii_digit() && code[2].is_ascii_digit() {
        std::str::from_utf8(root).ok()
    } else {
        None
    }
}

fn binance(market_type: MarketType, symbol: &str) -> Option<(&str, &str)> {
    if market_type == MarketType::EuropeanOption {
        // BTC-220624-30000-C settles in USDT.
        let base = symbol.split('-').next().filter(|s| !s.is_empty())?;
        return Some((base, "USDT"));
    }
    // BTCUSD_PERP, BTCUSDT_220624
    let root = symbol.split('_').next()?;
    if market_type.is_inverse() {
        root.strip_suffix("USD")
            .filter(|base| !base.is_empty())
            .map(|base| (base, "USD"))
    } else {
        split_quote_suffix(root)
    }
}

fn bybit(market_type: MarketType, symbol: &str) -> Option<(&str, &str)> {
    // USDC perpetuals are listed as BTCPERP.
    if let Some(base) = symbol.strip_suffix("PERP").filter(|b| !b.is_empty()) {
        return Some((base, "USDC"));
    }
    let root = strip_month_code(symbol).unwrap_or(symbol);
    split_usd_first(market_type, root)
}

fn deribit(symbol: &str) -> Option<(&str, &str)> {
    let underlying = symbol.split('-').next().filter(|s| !s.is_empty())?;
    match underlying.split_once('_') {
        Some((base, quote)) if !base.is_empty() && !quote.is_empty() => Some((base, quote)),
        Some(_) => None,
        None => Some((underlying, "USD")),
    }
}

fn bitmex(market_type: MarketType, symbol: &str) -> Option<(&str, &str)> {
    if let Some(index) = symbol.strip_prefix('.') {
        return bitmex_bvol(index);
    }
    if let Some(root) = strip_month_code(symbol) {
        if let Some(pair) = split_usd_first(market_type, root) {
            return Some(pair);
        }
        // XBTM22 is quoted in USD; altcoin futures like ETHM22 in XBT.
        return Some(if root == "XBT" { (root, "USD") } else { (root, "XBT") });
    }
    split_usd_first(market_type, symbol)
}

/// Volatility indices: `.BVOL24H` tracks XBT, `.ETHBVOL24H` tracks ETH.
/// Other index symbols such as `.BXBT` have no pair.
fn bitmex_bvol(index: &str) -> Option<(&str, &str)> {
    let (underlying, _) = index.split_once("BVOL")?;
    Some((if underlying.is_empty() { "XBT" } else { underlying }, "USD"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(exchange: Exchange, market_type: MarketType, symbol: &str) -> Option<String> {
        normalize_pair(exchange, market_type, symbol)
    }

    #[test]
    fn test_binance() {
        assert_eq!(pair(Exchange::Binance, MarketType::InverseSwap, "BTCUSD_PERP").unwrap(), "BTC/USD");
        assert_eq!(pair(Exchange::Binance, MarketType::InverseFuture, "ETHUSD_220624").unwrap(), "ETH/USD");
        assert_eq!(pair(Exchange::Binance, MarketType::LinearSwap, "ETHUSDT").unwrap(), "ETH/USDT");
        assert_eq!(pair(Exchange::Binance, MarketType::LinearFuture, "BTCUSDT_220624").unwrap(), "BTC/USDT");
        assert_eq!(pair(Exchange::Binance, MarketType::Spot, "ETHBTC").unwrap(), "ETH/BTC");
        assert_eq!(pair(Exchange::Binance, MarketType::Spot, "BTCFDUSD").unwrap(), "BTC/FDUSD");
        assert_eq!(pair(Exchange::Binance, MarketType::EuropeanOption, "BTC-220624-30000-C").unwrap(), "BTC/USDT");
        assert_eq!(pair(Exchange::Binance, MarketType::Spot, "USDT"), None);
    }

    #[test]
    fn test_bybit() {
        assert_eq!(pair(Exchange::Bybit, MarketType::LinearSwap, "BTCUSDT").unwrap(), "BTC/USDT");
        assert_eq!(pair(Exchange::Bybit, MarketType::InverseSwap, "BTCUSD").unwrap(), "BTC/USD");
        assert_eq!(pair(Exchange::Bybit, MarketType::InverseFuture, "BTCUSDM22").unwrap(), "BTC/USD");
        assert_eq!(pair(Exchange::Bybit, MarketType::LinearSwap, "ETHPERP").unwrap(), "ETH/USDC");
        assert_eq!(pair(Exchange::Bybit, MarketType::InverseSwap, "DOTUSD").unwrap(), "DOT/USD");
        assert_eq!(pair(Exchange::Bybit, MarketType::InverseFuture, "DOTUSDZ22").unwrap(), "DOT/USD");
        assert_eq!(pair(Exchange::Bybit, MarketType::Spot, "BTCTUSD").unwrap(), "BTC/TUSD");
    }

    #[test]
    fn test_okx_and_coinbase() {
        assert_eq!(pair(Exchange::Okx, MarketType::LinearSwap, "BTC-USDT-SWAP").unwrap(), "BTC/USDT");
        assert_eq!(pair(Exchange::Okx, MarketType::EuropeanOption, "BTC-USD-220624-30000-C").unwrap(), "BTC/USD");
        assert_eq!(pair(Exchange::CoinbasePro, MarketType::Spot, "ETH-EUR").unwrap(), "ETH/EUR");
        assert_eq!(pair(Exchange::Okx, MarketType::Spot, "BTC"), None);
    }

    #[test]
    fn test_deribit() {
        assert_eq!(pair(Exchange::Deribit, MarketType::InverseSwap, "BTC-PERPETUAL").unwrap(), "BTC/USD");
        assert_eq!(pair(Exchange::Deribit, MarketType::InverseFuture, "ETH-24JUN22").unwrap(), "ETH/USD");
        assert_eq!(pair(Exchange::Deribit, MarketType::LinearSwap, "ETH_USDC-PERPETUAL").unwrap(), "ETH/USDC");
        assert_eq!(pair(Exchange::Deribit, MarketType::EuropeanOption, "BTC-24JUN22-30000-C").unwrap(), "BTC/USD");
    }

    #[test]
    fn test_bitmex() {
        assert_eq!(pair(Exchange::Bitmex, MarketType::InverseSwap, "XBTUSD").unwrap(), "BTC/USD");
        assert_eq!(pair(Exchange::Bitmex, MarketType::InverseFuture, "XBTM22").unwrap(), "BTC/USD");
        assert_eq!(pair(Exchange::Bitmex, MarketType::InverseFuture, "ETHM22").unwrap(), "ETH/BTC");
        assert_eq!(pair(Exchange::Bitmex, MarketType::InverseSwap, "XBTEUR").unwrap(), "BTC/EUR");
        assert_eq!(pair(Exchange::Bitmex, MarketType::InverseSwap, ".BXBT"), None);
        assert_eq!(pair(Exchange::Bitmex, MarketType::LinearSwap, "XBTUSDT").unwrap(), "BTC/USDT");
    }

    #[test]
    fn test_bitmex_quanto_and_bvol() {
        assert_eq!(pair(Exchange::Bitmex, MarketType::QuantoSwap, "ETHUSD").unwrap(), "ETH/USD");
        assert_eq!(pair(Exchange::Bitmex, MarketType::QuantoFuture, "ETHUSDM22").unwrap(), "ETH/USD");
        assert_eq!(pair(Exchange::Bitmex, MarketType::Bvol, ".BVOL24H").unwrap(), "BTC/USD");
        assert_eq!(pair(Exchange::Bitmex, MarketType::Bvol, ".ETHBVOL7D").unwrap(), "ETH/USD");
    }

    #[test]
    fn test_strip_month_code() {
        assert_eq!(strip_month_code("XBTZ22"), Some("XBT"));
        assert_eq!(strip_month_code("XBTUSD"), None);
        assert_eq!(strip_month_code("M22"), None);
    }
}
