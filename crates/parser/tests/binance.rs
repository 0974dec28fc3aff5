//! Binance integration tests against captured combined-stream payloads.

use cmp_core::types::{MarketType, MessageType, OpenInterestUnit, TradeSide};
use cmp_parser::{
    extract_symbol, extract_timestamp, get_msg_type, parse_bbo, parse_candlestick,
    parse_funding_rate, parse_l2, parse_l2_topk, parse_open_interest, parse_trade, ParseError,
};

const EXCHANGE: &str = "binance";

const INVERSE_AGG_TRADE: &str = r#"{"stream":"btcusd_perp@aggTrade","data":{"e":"aggTrade","E":1616201883458,"a":41045788,"s":"BTCUSD_PERP","p":"58570.1","q":"58","f":91864326,"l":91864327,"T":1616201883304,"m":true}}"#;

const INVERSE_MARK_PRICE: &str = r#"{"stream":"btcusd_perp@markPrice","data":{"e":"markPriceUpdate","E":1617309477000,"s":"BTCUSD_PERP","p":"59012.56007222","P":"58896.00503145","r":"0.00073689","T":1617321600000}}"#;

const INVERSE_DEPTH: &str = r#"{"stream":"btcusd_perp@depth@100ms","data":{"e":"depthUpdate","E":1622370862564,"T":1622370862553,"s":"BTCUSD_PERP","ps":"BTCUSD","U":127559587191,"u":127559588177,"pu":127559587113,"b":[["35365.9","1400"],["35425.8","561"]],"a":[["35817.8","7885"],["35818.7","307"]]}}"#;

// ── Field extractors and classifier ─────────────────────────────────

#[test]
fn test_extract_symbol() {
    let symbol = extract_symbol(EXCHANGE, MarketType::InverseSwap, INVERSE_AGG_TRADE);
    assert_eq!(symbol.as_deref(), Some("BTCUSD_PERP"));
}

#[test]
fn test_extract_symbol_all_market_stream() {
    let msg = r#"{"stream":"!markPrice@arr","data":[{"e":"markPriceUpdate","E":1617309477000,"s":"BTCUSDT","p":"1","P":"1","r":"0.0001","T":1617321600000},{"e":"markPriceUpdate","E":1617309477001,"s":"ETHUSDT","p":"1","P":"1","r":"0.0001","T":1617321600000}]}"#;
    assert_eq!(
        extract_symbol(EXCHANGE, MarketType::LinearSwap, msg).as_deref(),
        Some("ALL")
    );
    assert_eq!(
        extract_timestamp(EXCHANGE, MarketType::LinearSwap, msg, None).unwrap(),
        Some(1617309477001)
    );
}

#[test]
fn test_extract_timestamp() {
    let ts = extract_timestamp(EXCHANGE, MarketType::InverseSwap, INVERSE_MARK_PRICE, None);
    assert_eq!(ts.unwrap(), Some(1617309477000));
}

#[test]
fn test_extract_timestamp_falls_back_to_received_at() {
    let msg = r#"{"stream":"btcusdt@depth5","data":{"lastUpdateId":160,"bids":[["0.0024","10"]],"asks":[["0.0026","100"]]}}"#;
    let ts = extract_timestamp(EXCHANGE, MarketType::Spot, msg, Some(1650000000000));
    assert_eq!(ts.unwrap(), Some(1650000000000));
}

#[test]
fn test_extract_timestamp_rejects_garbage() {
    let msg = r#"{"stream":"btcusdt@aggTrade","data":{"e":"aggTrade","E":"soon","s":"BTCUSDT"}}"#;
    let err = extract_timestamp(EXCHANGE, MarketType::Spot, msg, None).unwrap_err();
    assert!(matches!(err, ParseError::TimestampParse(_)));
}

#[test]
fn test_get_msg_type() {
    assert_eq!(get_msg_type(EXCHANGE, INVERSE_AGG_TRADE), MessageType::Trade);
    assert_eq!(get_msg_type(EXCHANGE, INVERSE_DEPTH), MessageType::L2Event);
    assert_eq!(get_msg_type(EXCHANGE, INVERSE_MARK_PRICE), MessageType::FundingRate);
    assert_eq!(get_msg_type(EXCHANGE, "not json"), MessageType::Other);
}

// ── Trades ───────────────────────────────────────────────────────────

#[test]
fn test_parse_trade_inverse_swap() {
    let trades = parse_trade(EXCHANGE, MarketType::InverseSwap, INVERSE_AGG_TRADE).unwrap();
    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert_eq!(trade.exchange.as_str(), "binance");
    assert_eq!(trade.market_type, MarketType::InverseSwap);
    assert_eq!(trade.msg_type, MessageType::Trade);
    assert_eq!(trade.symbol, "BTCUSD_PERP");
    assert_eq!(trade.pair, "BTC/USD");
    assert_eq!(trade.timestamp, 1616201883304);
    assert_eq!(trade.price, 58570.1);
    assert_eq!(trade.quantity_base, 5800.0 / 58570.1);
    assert_eq!(trade.quantity_quote, 5800.0);
    assert_eq!(trade.quantity_contract, Some(58.0));
    assert_eq!(trade.side, TradeSide::Sell);
    assert_eq!(trade.trade_id.as_deref(), Some("41045788"));
    assert_eq!(trade.json, INVERSE_AGG_TRADE);
}

#[test]
fn test_parse_trade_spot() {
    let msg = r#"{"stream":"btcusdt@trade","data":{"e":"trade","E":1616206407184,"s":"BTCUSDT","t":725224651,"p":"58460.94","q":"0.00200","b":5305548880,"a":5305548802,"T":1616206407183,"m":false,"M":true}}"#;
    let trades = parse_trade(EXCHANGE, MarketType::Spot, msg).unwrap();
    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert_eq!(trade.pair, "BTC/USDT");
    assert_eq!(trade.quantity_base, 0.002);
    assert_eq!(trade.quantity_quote, 58460.94 * 0.002);
    assert_eq!(trade.quantity_contract, None);
    assert_eq!(trade.side, TradeSide::Buy);
    assert_eq!(trade.trade_id.as_deref(), Some("725224651"));
}

#[test]
fn test_parse_trade_wrong_category_is_empty() {
    let trades = parse_trade(EXCHANGE, MarketType::InverseSwap, INVERSE_DEPTH).unwrap();
    assert!(trades.is_empty());
}

// ── Order books ─────────────────────────────────────────────────────

#[test]
fn test_parse_l2_inverse_swap() {
    let books = parse_l2(EXCHANGE, MarketType::InverseSwap, INVERSE_DEPTH, None).unwrap();
    assert_eq!(books.len(), 1);
    let book = &books[0];
    assert_eq!(book.msg_type, MessageType::L2Event);
    assert_eq!(book.asks.len(), 2);
    assert_eq!(book.bids.len(), 2);
    assert!(!book.snapshot);
    assert_eq!(book.timestamp, 1622370862564);
    assert_eq!(book.seq_id, Some(127559588177));
    assert_eq!(book.prev_seq_id, Some(127559587113));
    assert_eq!(book.bids[0].price, 35365.9);
    assert_eq!(book.bids[0].quantity_contract, Some(1400.0));
    assert_eq!(book.bids[0].quantity_quote, 140000.0);
    assert_eq!(book.asks[0].price, 35817.8);
    assert_eq!(book.asks[0].quantity_contract, Some(7885.0));

    let json = serde_json::to_value(book).unwrap();
    assert_eq!(json["bids"][0][3], 1400.0);
    assert_eq!(json["asks"][0][3], 7885.0);
}

#[test]
fn test_parse_l2_spot_chains_on_first_update_id() {
    let msg = r#"{"stream":"btcusdt@depth@100ms","data":{"e":"depthUpdate","E":1622370862564,"s":"BTCUSDT","U":157,"u":160,"b":[["35365.9","0.5"]],"a":[]}}"#;
    let books = parse_l2(EXCHANGE, MarketType::Spot, msg, None).unwrap();
    assert_eq!(books[0].seq_id, Some(160));
    assert_eq!(books[0].prev_seq_id, Some(156));
    assert_eq!(books[0].bids[0].quantity_contract, None);
    assert!(books[0].asks.is_empty());
}

#[test]
fn test_parse_l2_topk_linear_swap() {
    let msg = r#"{"stream":"ethusdt@depth20","data":{"e":"depthUpdate","E":1651122265861,"T":1651122265854,"s":"ETHUSDT","U":1437010873371,"u":1437010882721,"pu":1437010873329,"b":[["2886.71","0.454"],["2886.70","2.755"],["2886.67","1.000"]],"a":[["2886.72","77.215"],["2886.73","1.734"],["2886.74","0.181"]]}}"#;
    let books = parse_l2_topk(EXCHANGE, MarketType::LinearSwap, msg, None).unwrap();
    assert_eq!(books.len(), 1);
    let book = &books[0];
    assert_eq!(book.msg_type, MessageType::L2TopK);
    assert_eq!(book.asks.len(), 3);
    assert_eq!(book.bids.len(), 3);
    assert!(book.snapshot);
    assert_eq!(book.timestamp, 1651122265861);
    assert_eq!(book.seq_id, Some(1437010882721));
    assert_eq!(book.prev_seq_id, Some(1437010873329));
    assert_eq!(book.bids[0].price, 2886.71);
    assert_eq!(book.bids[0].quantity_contract, Some(0.454));
    assert_eq!(book.asks[0].price, 2886.72);
    assert_eq!(book.asks[0].quantity_contract, Some(77.215));
}

#[test]
fn test_parse_l2_topk_spot_uses_received_at() {
    let msg = r#"{"stream":"btcusdt@depth5@100ms","data":{"lastUpdateId":160,"bids":[["0.0024","10"]],"asks":[["0.0026","100"]]}}"#;
    let books = parse_l2_topk(EXCHANGE, MarketType::Spot, msg, Some(1650000000123)).unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].symbol, "BTCUSDT");
    assert_eq!(books[0].timestamp, 1650000000123);
    assert_eq!(books[0].seq_id, Some(160));
    assert!(books[0].snapshot);
}

#[test]
fn test_parse_l2_topk_spot_without_received_at_is_empty() {
    let msg = r#"{"stream":"btcusdt@depth5@100ms","data":{"lastUpdateId":160,"bids":[["0.0024","10"]],"asks":[["0.0026","100"]]}}"#;
    assert!(parse_l2_topk(EXCHANGE, MarketType::Spot, msg, None).unwrap().is_empty());
}

// ── BBO, candlesticks, funding, open interest ───────────────────────

#[test]
fn test_parse_bbo_linear_swap() {
    let msg = r#"{"stream":"ethusdt@bookTicker","data":{"e":"bookTicker","u":1553413152520,"s":"ETHUSDT","b":"1778.54","B":"15.164","a":"1778.55","A":"7.289","T":1653817855284,"E":1653817855289}}"#;
    let bbos = parse_bbo(EXCHANGE, MarketType::LinearSwap, msg, None).unwrap();
    assert_eq!(bbos.len(), 1);
    let bbo = &bbos[0];
    assert_eq!(bbo.msg_type, MessageType::Bbo);
    assert_eq!(bbo.symbol, "ETHUSDT");
    assert_eq!(bbo.timestamp, 1653817855289);
    assert_eq!(bbo.id, Some(1553413152520));
    assert_eq!(bbo.ask_price, 1778.55);
    assert_eq!(bbo.ask_quantity_base, 7.289);
    assert_eq!(bbo.ask_quantity_quote, 1778.55 * 7.289);
    assert_eq!(bbo.ask_quantity_contract, Some(7.289));
    assert_eq!(bbo.bid_price, 1778.54);
    assert_eq!(bbo.bid_quantity_base, 15.164);
    assert_eq!(bbo.bid_quantity_quote, 1778.54 * 15.164);
    assert_eq!(bbo.bid_quantity_contract, Some(15.164));
}

#[test]
fn test_parse_candlestick_linear_swap() {
    let msg = r#"{"stream":"btcusdt@kline_1M","data":{"e":"kline","E":1653819041520,"s":"BTCUSDT","k":{"t":1651363200000,"T":1654041599999,"s":"BTCUSDT","i":"1M","f":2172726276,"L":2301806561,"o":"37614.40","c":"29075.50","h":"40071.70","l":"26631.00","v":"13431981.671","n":129025447,"x":false,"q":"423075730671.12853","V":"6700065.176","Q":"211000435586.65000","B":"0"}}}"#;
    let klines = parse_candlestick(EXCHANGE, MarketType::LinearSwap, msg, None).unwrap();
    assert_eq!(klines.len(), 1);
    let k = &klines[0];
    assert_eq!(k.msg_type, MessageType::Candlestick);
    assert_eq!(k.symbol, "BTCUSDT");
    assert_eq!(k.timestamp, 1653819041520);
    assert_eq!(k.period, "1M");
    assert_eq!(k.begin_time, 1651363200);
    assert_eq!(k.open, 37614.40);
    assert_eq!(k.high, 40071.70);
    assert_eq!(k.low, 26631.0);
    assert_eq!(k.close, 29075.5);
    assert_eq!(k.volume, 13431981.671);
    assert_eq!(k.quote_volume, Some(423075730671.12853));
}

#[test]
fn test_parse_funding_rate_inverse_swap() {
    let rates =
        parse_funding_rate(EXCHANGE, MarketType::InverseSwap, INVERSE_MARK_PRICE, None).unwrap();
    assert_eq!(rates.len(), 1);
    let rate = &rates[0];
    assert_eq!(rate.msg_type, MessageType::FundingRate);
    assert_eq!(rate.pair, "BTC/USD");
    assert_eq!(rate.funding_rate, 0.00073689);
    assert_eq!(rate.funding_time, 1617321600000);
    assert_eq!(rate.timestamp, 1617309477000);
}

#[test]
fn test_parse_funding_rate_skips_delivery_contracts() {
    let msg = r#"{"stream":"!markPrice@arr","data":[{"e":"markPriceUpdate","E":1617309477000,"s":"BTCUSD_PERP","p":"1","P":"1","r":"0.0001","T":1617321600000},{"e":"markPriceUpdate","E":1617309477000,"s":"BTCUSD_210625","p":"1","P":"1","r":"","T":0}]}"#;
    let rates = parse_funding_rate(EXCHANGE, MarketType::InverseSwap, msg, None).unwrap();
    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].symbol, "BTCUSD_PERP");
}

#[test]
fn test_parse_funding_rate_spot_is_empty() {
    let rates = parse_funding_rate(EXCHANGE, MarketType::Spot, INVERSE_MARK_PRICE, None).unwrap();
    assert!(rates.is_empty());
}

#[test]
fn test_parse_open_interest() {
    let msg = r#"{"symbol":"BTCUSD_PERP","pair":"BTCUSD","openInterest":"87654","contractType":"PERPETUAL","time":1617309477000}"#;
    assert_eq!(get_msg_type(EXCHANGE, msg), MessageType::OpenInterest);
    let ois = parse_open_interest(EXCHANGE, MarketType::InverseSwap, msg, None).unwrap();
    assert_eq!(ois.len(), 1);
    assert_eq!(ois[0].open_interest, 87654.0);
    assert_eq!(ois[0].unit, OpenInterestUnit::Contract);
    assert_eq!(ois[0].timestamp, 1617309477000);

    let msg = r#"{"symbol":"BTCUSDT","openInterest":"10659.509","time":1617309477000}"#;
    let ois = parse_open_interest(EXCHANGE, MarketType::LinearSwap, msg, None).unwrap();
    assert_eq!(ois[0].unit, OpenInterestUnit::Base);
}
