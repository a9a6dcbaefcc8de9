pub mod error;
pub mod market;

pub use error::FeedError;
pub use market::cache::{QuoteCache, QUOTE_CACHE_TTL};
pub use market::feed::{MarketFeed, QuoteSink, Subscription};
pub use market::fetch::{QuoteFetcher, DEFAULT_PROXY_BASE_URL, DEFAULT_SYMBOL_MAP};
pub use market::service::{MarketDataService, STREAM_TICK_INTERVAL};
pub use market::store::{MarketDataStore, StorePhase, REFRESH_INTERVAL};
pub use market::synthetic::{SyntheticQuoteGenerator, DEFAULT_BASE_PRICES};
pub use market::types::{
    Candle, CandleInterval, Quote, DEFAULT_CANDLE_INTERVAL, DEFAULT_SYMBOL, TRADING_SYMBOLS,
};
