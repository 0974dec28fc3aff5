//! Deribit integration tests.

use cmp_core::types::{MarketType, MessageType, OpenInterestUnit, TradeSide};
use cmp_parser::{
    extract_symbol, extract_timestamp, get_msg_type, parse_bbo, parse_candlestick,
    parse_funding_rate, parse_l2, parse_l2_topk, parse_open_interest, parse_trade,
};

const EXCHANGE: &str = "deribit";

const PERP_TRADES: &str = r#"{"jsonrpc":"2.0","method":"subscription","params":{"channel":"trades.BTC-PERPETUAL.raw","data":[{"trade_seq":87392553,"trade_id":"125775185","timestamp":1616289960548,"tick_direction":0,"price":58160.5,"mark_price":58155.62,"instrument_name":"BTC-PERPETUAL","index_price":58130.58,"direction":"buy","amount":1000.0}]}}"#;

const PERP_TICKER: &str = r#"{"jsonrpc":"2.0","method":"subscription","params":{"channel":"ticker.BTC-PERPETUAL.100ms","data":{"timestamp":1654041600001,"stats":{"volume":1000.0},"state":"open","open_interest":123456789.0,"mark_price":31700.5,"last_price":31701.0,"instrument_name":"BTC-PERPETUAL","index_price":31690.1,"funding_8h":0.0001,"current_funding":0.00002}}}"#;

#[test]
fn test_classifier_and_extractors() {
    assert_eq!(get_msg_type(EXCHANGE, PERP_TRADES), MessageType::Trade);
    assert_eq!(get_msg_type(EXCHANGE, PERP_TICKER), MessageType::Ticker);
    assert_eq!(
        get_msg_type(EXCHANGE, r#"{"jsonrpc":"2.0","id":1,"result":[]}"#),
        MessageType::Other
    );
    assert_eq!(
        extract_symbol(EXCHANGE, MarketType::InverseSwap, PERP_TRADES).as_deref(),
        Some("BTC-PERPETUAL")
    );
    assert_eq!(
        extract_timestamp(EXCHANGE, MarketType::InverseSwap, PERP_TRADES, None).unwrap(),
        Some(1616289960548)
    );
}

#[test]
fn test_parse_trade_inverse_amount_is_usd() {
    let trades = parse_trade(EXCHANGE, MarketType::InverseSwap, PERP_TRADES).unwrap();
    assert_eq!(trades.len(), 1);
    let t = &trades[0];
    assert_eq!(t.pair, "BTC/USD");
    assert_eq!(t.side, TradeSide::Buy);
    assert_eq!(t.quantity_quote, 1000.0);
    assert_eq!(t.quantity_base, 1000.0 / 58160.5);
    assert_eq!(t.quantity_contract, Some(100.0));
    assert_eq!(t.trade_id.as_deref(), Some("125775185"));
}

#[test]
fn test_parse_trade_option_amount_is_base() {
    let msg = r#"{"jsonrpc":"2.0","method":"subscription","params":{"channel":"trades.option.BTC.raw","data":[{"trade_id":"125775186","timestamp":1616289960548,"price":0.0325,"instrument_name":"BTC-25JUN21-60000-C","direction":"sell","amount":2.5}]}}"#;
    let trades = parse_trade(EXCHANGE, MarketType::EuropeanOption, msg).unwrap();
    let t = &trades[0];
    assert_eq!(t.pair, "BTC/USD");
    assert_eq!(t.quantity_base, 2.5);
    assert_eq!(t.quantity_contract, Some(2.5));
    assert_eq!(t.side, TradeSide::Sell);
}

#[test]
fn test_parse_l2_raw_book() {
    let msg = r#"{"jsonrpc":"2.0","method":"subscription","params":{"channel":"book.BTC-PERPETUAL.raw","data":{"type":"change","timestamp":1616289960600,"prev_change_id":28771431045,"instrument_name":"BTC-PERPETUAL","change_id":28771431046,"bids":[["new",58000.0,2000.0]],"asks":[["delete",58001.0,0.0]]}}}"#;
    let books = parse_l2(EXCHANGE, MarketType::InverseSwap, msg, None).unwrap();
    assert_eq!(books.len(), 1);
    let book = &books[0];
    assert!(!book.snapshot);
    assert_eq!(book.seq_id, Some(28771431046));
    assert_eq!(book.prev_seq_id, Some(28771431045));
    assert_eq!(book.bids[0].price, 58000.0);
    assert_eq!(book.bids[0].quantity_quote, 2000.0);
    assert_eq!(book.bids[0].quantity_contract, Some(200.0));
    assert_eq!(book.asks[0].quantity_quote, 0.0);
}

#[test]
fn test_parse_l2_topk_grouped_book() {
    let msg = r#"{"jsonrpc":"2.0","method":"subscription","params":{"channel":"book.BTC-PERPETUAL.none.10.100ms","data":{"timestamp":1616289960600,"instrument_name":"BTC-PERPETUAL","change_id":28771431046,"bids":[[58000.0,2000.0],[57999.5,10.0]],"asks":[[58001.0,500.0]]}}}"#;
    let books = parse_l2_topk(EXCHANGE, MarketType::InverseSwap, msg, None).unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].msg_type, MessageType::L2TopK);
    assert!(books[0].snapshot);
    assert_eq!(books[0].bids.len(), 2);
    assert_eq!(get_msg_type(EXCHANGE, msg), MessageType::L2TopK);
}

#[test]
fn test_parse_bbo() {
    let msg = r#"{"jsonrpc":"2.0","method":"subscription","params":{"channel":"quote.BTC-PERPETUAL","data":{"timestamp":1616289960600,"instrument_name":"BTC-PERPETUAL","best_bid_price":58000.0,"best_bid_amount":2000.0,"best_ask_price":58001.0,"best_ask_amount":500.0}}}"#;
    let bbos = parse_bbo(EXCHANGE, MarketType::InverseSwap, msg, None).unwrap();
    assert_eq!(bbos.len(), 1);
    assert_eq!(bbos[0].timestamp, 1616289960600);
    assert_eq!(bbos[0].ask_quantity_quote, 500.0);
    assert_eq!(bbos[0].ask_quantity_contract, Some(50.0));
}

#[test]
fn test_parse_bbo_option_without_bids() {
    let msg = r#"{"jsonrpc":"2.0","method":"subscription","params":{"channel":"quote.BTC-24JUN22-30000-C","data":{"timestamp":1616289960600,"instrument_name":"BTC-24JUN22-30000-C","best_bid_price":0.0,"best_bid_amount":0.0,"best_ask_price":0.0005,"best_ask_amount":12.0}}}"#;
    let bbos = parse_bbo(EXCHANGE, MarketType::EuropeanOption, msg, None).unwrap();
    assert_eq!(bbos.len(), 1);
    let b = &bbos[0];
    assert_eq!(b.pair, "BTC/USD");
    assert_eq!(b.bid_price, 0.0);
    assert_eq!(b.bid_quantity_base, 0.0);
    assert_eq!(b.bid_quantity_quote, 0.0);
    assert_eq!(b.bid_quantity_contract, Some(0.0));
    assert_eq!(b.ask_price, 0.0005);
    assert_eq!(b.ask_quantity_base, 12.0);
    assert_eq!(b.ask_quantity_contract, Some(12.0));
}

#[test]
fn test_parse_candlestick() {
    let msg = r#"{"jsonrpc":"2.0","method":"subscription","params":{"channel":"chart.trades.BTC-PERPETUAL.60","data":{"volume":12.5,"tick":1616288400000,"open":58000.0,"low":57900.0,"high":58200.0,"cost":725000.0,"close":58160.5}}}"#;
    assert_eq!(
        extract_symbol(EXCHANGE, MarketType::InverseSwap, msg).as_deref(),
        Some("BTC-PERPETUAL")
    );
    let klines = parse_candlestick(EXCHANGE, MarketType::InverseSwap, msg, None).unwrap();
    assert_eq!(klines.len(), 1);
    let k = &klines[0];
    assert_eq!(k.period, "1h");
    assert_eq!(k.begin_time, 1616288400);
    assert_eq!(k.volume, 12.5);
    assert_eq!(k.quote_volume, Some(725000.0));
}

#[test]
fn test_parse_funding_rate_from_ticker() {
    let rates = parse_funding_rate(EXCHANGE, MarketType::InverseSwap, PERP_TICKER, None).unwrap();
    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].funding_rate, 0.0001);
    assert_eq!(rates[0].estimated_rate, Some(0.00002));
    assert_eq!(rates[0].funding_time, 1654070400000);
    assert_eq!(rates[0].timestamp, 1654041600001);
}

#[test]
fn test_parse_open_interest_from_ticker() {
    let ois = parse_open_interest(EXCHANGE, MarketType::InverseSwap, PERP_TICKER, None).unwrap();
    assert_eq!(ois.len(), 1);
    assert_eq!(ois[0].open_interest, 123456789.0);
    assert_eq!(ois[0].unit, OpenInterestUnit::Quote);
}

#[test]
fn test_spot_is_unsupported() {
    assert!(parse_trade(EXCHANGE, MarketType::Spot, PERP_TRADES).unwrap().is_empty());
}
