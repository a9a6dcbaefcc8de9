use crate::error::FeedError;
use crate::market::types::{Candle, CandleInterval, Quote};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub type QuoteSink = Arc<dyn Fn(Quote) + Send + Sync>;

/// Boundary between the store and whatever produces market data. The shipped
/// implementation simulates a push feed by polling; a genuine push transport
/// can satisfy the same contract.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    async fn market_data(&self, symbol: &str) -> Quote;

    async fn multiple_market_data(&self, symbols: &[String]) -> Result<Vec<Quote>, FeedError>;

    async fn candle_data(
        &self,
        symbol: &str,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, FeedError>;

    fn subscribe(&self, symbols: Vec<String>, on_update: QuoteSink) -> Subscription;
}

#[derive(Debug)]
pub struct Subscription {
    cancel_token: CancellationToken,
}

impl Subscription {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self { cancel_token }
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
