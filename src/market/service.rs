use crate::error::FeedError;
use crate::market::cache::QuoteCache;
use crate::market::feed::{MarketFeed, QuoteSink, Subscription};
use crate::market::fetch::QuoteFetcher;
use crate::market::synthetic::{SyntheticQuoteGenerator, SYNTHETIC_CANDLE_COUNT};
use crate::market::types::{Candle, CandleInterval, Quote};
use async_trait::async_trait;
use futures_util::future::join_all;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub const STREAM_TICK_INTERVAL: Duration = Duration::from_secs(2);
pub const STREAM_JITTER_SPAN: f64 = 0.001;

#[derive(Clone)]
pub struct MarketDataService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    fetcher: QuoteFetcher,
    generator: SyntheticQuoteGenerator,
    cache: QuoteCache,
}

impl MarketDataService {
    pub fn new() -> Self {
        Self::with_parts(
            QuoteFetcher::new(),
            SyntheticQuoteGenerator::new(),
            QuoteCache::new(),
        )
    }

    pub fn with_parts(
        fetcher: QuoteFetcher,
        generator: SyntheticQuoteGenerator,
        cache: QuoteCache,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                fetcher,
                generator,
                cache,
            }),
        }
    }
}

impl Default for MarketDataService {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceInner {
    async fn market_data(&self, symbol: &str) -> Quote {
        if let Some(quote) = self.cache.get(symbol) {
            return quote;
        }

        let quote = match self.fetcher.fetch(symbol).await {
            Ok(quote) => quote,
            Err(error) => {
                warn!(symbol, %error, "quote fetch failed, serving synthetic data");
                self.generator.quote(symbol)
            }
        };

        self.cache.put(quote.clone());
        quote
    }

    async fn candle_data(&self, symbol: &str, interval: CandleInterval) -> Vec<Candle> {
        match self.fetcher.fetch_candles(symbol, interval).await {
            Ok(candles) if !candles.is_empty() => candles,
            Ok(_) => {
                warn!(symbol, "empty candle history, serving synthetic series");
                self.generator.candles(symbol, SYNTHETIC_CANDLE_COUNT)
            }
            Err(error) => {
                warn!(symbol, %error, "candle fetch failed, serving synthetic series");
                self.generator.candles(symbol, SYNTHETIC_CANDLE_COUNT)
            }
        }
    }
}

#[async_trait]
impl MarketFeed for MarketDataService {
    async fn market_data(&self, symbol: &str) -> Quote {
        self.inner.market_data(symbol).await
    }

    async fn multiple_market_data(&self, symbols: &[String]) -> Result<Vec<Quote>, FeedError> {
        let quotes = join_all(
            symbols
                .iter()
                .map(|symbol| self.inner.market_data(symbol)),
        )
        .await;
        Ok(quotes)
    }

    async fn candle_data(
        &self,
        symbol: &str,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, FeedError> {
        Ok(self.inner.candle_data(symbol, interval).await)
    }

    fn subscribe(&self, symbols: Vec<String>, on_update: QuoteSink) -> Subscription {
        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(STREAM_TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        for symbol in &symbols {
                            let mut quote = tokio::select! {
                                _ = task_token.cancelled() => return,
                                quote = inner.market_data(symbol) => quote,
                            };
                            if task_token.is_cancelled() {
                                return;
                            }
                            let variation = (rand::rng().random::<f64>() - 0.5) * STREAM_JITTER_SPAN;
                            apply_stream_jitter(&mut quote, variation);
                            on_update(quote);
                        }
                    }
                }
            }
        });

        Subscription::new(cancel_token)
    }
}

pub fn apply_stream_jitter(quote: &mut Quote, variation: f64) {
    quote.price *= 1.0 + variation;
    quote.change += quote.price * variation;
    quote.change_percent = quote.change / (quote.price - quote.change) * 100.0;
}
