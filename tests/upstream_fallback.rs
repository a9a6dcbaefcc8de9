use market_feed::{
    CandleInterval, MarketDataStore, MarketDataService, MarketFeed, QuoteCache, QuoteFetcher,
    StorePhase, SyntheticQuoteGenerator, DEFAULT_SYMBOL_MAP, TRADING_SYMBOLS,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn chart_body(symbol: &str, price: f64, previous_close: f64) -> String {
    format!(
        concat!(
            r#"{{"chart":{{"result":[{{"meta":{{"symbol":"{symbol}","regularMarketPrice":{price},"#,
            r#""previousClose":{prev},"regularMarketDayHigh":{high},"regularMarketDayLow":{low},"#,
            r#""regularMarketVolume":52100}},"timestamp":[1754300000,1754300060],"#,
            r#""indicators":{{"quote":[{{"open":[{open},{price}],"high":[{high},{high}],"#,
            r#""low":[{low},{low}],"close":[{open},{price}],"volume":[120,95]}}]}}}}],"error":null}}}}"#
        ),
        symbol = symbol,
        price = price,
        prev = previous_close,
        high = price + 5.0,
        low = price - 5.0,
        open = previous_close + 1.0,
    )
}

fn ok_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn error_response() -> String {
    let body = r#"{"error":"Failed to fetch data from upstream."}"#;
    format!(
        "HTTP/1.1 500 Internal Server Error\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn route(request_head: &str) -> String {
    if request_head.contains("/GC=F") {
        ok_response(&chart_body("GC=F", 3_315.5, 3_300.0))
    } else if request_head.contains("/BTC-USD") {
        ok_response(&chart_body("BTC-USD", 118_250.0, 117_000.0))
    } else {
        error_response()
    }
}

async fn spawn_stub_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("stub upstream should bind");
    let addr = listener.local_addr().expect("stub upstream has an address");

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buffer = [0_u8; 2_048];
                let mut head = Vec::new();
                loop {
                    let Ok(read) = socket.read(&mut buffer).await else {
                        return;
                    };
                    if read == 0 {
                        break;
                    }
                    head.extend_from_slice(&buffer[..read]);
                    if head.windows(4).any(|window| window == b"\r\n\r\n") {
                        break;
                    }
                }
                let response = route(&String::from_utf8_lossy(&head));
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("probe listener should bind");
    let addr = listener.local_addr().expect("probe listener has an address");
    drop(listener);
    format!("http://{addr}/chart")
}

fn service_at(endpoint: String) -> MarketDataService {
    MarketDataService::with_parts(
        QuoteFetcher::with_endpoint(endpoint, DEFAULT_SYMBOL_MAP),
        SyntheticQuoteGenerator::new(),
        QuoteCache::new(),
    )
}

#[tokio::test]
async fn batch_fetch_isolates_a_single_failing_symbol() {
    let addr = spawn_stub_upstream().await;
    let service = service_at(format!("http://{addr}"));

    let symbols: Vec<String> = ["XAUUSD", "EURUSD", "BTCUSD"]
        .iter()
        .map(|symbol| symbol.to_string())
        .collect();
    let quotes = service
        .multiple_market_data(&symbols)
        .await
        .expect("bulk fetch settles every symbol");

    assert_eq!(quotes.len(), 3);
    for (quote, symbol) in quotes.iter().zip(&symbols) {
        assert_eq!(&quote.symbol, symbol);
    }

    // healthy symbols carry the upstream numbers
    assert_eq!(quotes[0].price, 3_315.5);
    assert!((quotes[0].change - 15.5).abs() < 1e-9);
    assert_eq!(quotes[0].volume, "52.1K");
    assert_eq!(quotes[2].price, 118_250.0);

    // the broken symbol degrades to synthetic data around its base price
    assert!(quotes[1].price >= 1.15 * 0.99);
    assert!(quotes[1].price <= 1.15 * 1.01);
    assert_eq!(quotes[1].open, 1.15);
}

#[tokio::test]
async fn candle_series_decodes_from_the_upstream_envelope() {
    let addr = spawn_stub_upstream().await;
    let service = service_at(format!("http://{addr}"));

    let candles = service
        .candle_data("XAUUSD", CandleInterval::M1)
        .await
        .expect("candle path never fails");

    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].close, 3_301.0);
    assert_eq!(candles[1].close, 3_315.5);
    assert!(candles[0].time < candles[1].time);
}

#[tokio::test]
async fn unreachable_upstream_still_reaches_ready_with_synthetic_quotes() {
    let service = service_at(dead_endpoint().await);
    let generator = SyntheticQuoteGenerator::new();
    let store = MarketDataStore::new(Arc::new(service));

    store.initialize().await;

    assert_eq!(store.phase(), StorePhase::Ready);
    assert!(store.error().is_none());

    let quotes = store.quotes();
    assert_eq!(quotes.len(), TRADING_SYMBOLS.len());
    for symbol in TRADING_SYMBOLS {
        let quote = quotes.get(symbol).expect("every symbol is populated");
        let base = generator.base_price(symbol);
        assert!(quote.price >= base * 0.99, "{symbol} price below range");
        assert!(quote.price <= base * 1.01, "{symbol} price above range");
    }
    assert!(!store.selected_candles().is_empty());

    store.shutdown().await;
}
