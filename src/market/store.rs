use crate::error::FeedError;
use crate::market::feed::{MarketFeed, QuoteSink, Subscription};
use crate::market::types::{
    Candle, Quote, DEFAULT_CANDLE_INTERVAL, DEFAULT_SYMBOL, TRADING_SYMBOLS,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    Idle,
    Loading,
    Ready,
    Error,
}

#[derive(Debug)]
struct StoreState {
    quotes: HashMap<String, Quote>,
    candles: HashMap<String, Vec<Candle>>,
    pending_candles: HashSet<String>,
    selected_symbol: String,
    phase: StorePhase,
    error: Option<String>,
}

struct StoreRuntime {
    subscription: Option<Subscription>,
    refresh_task: Option<JoinHandle<()>>,
}

pub struct MarketDataStore {
    feed: Arc<dyn MarketFeed>,
    symbols: Vec<String>,
    state: Arc<Mutex<StoreState>>,
    runtime: Mutex<StoreRuntime>,
    cancel_token: CancellationToken,
}

impl MarketDataStore {
    pub fn new(feed: Arc<dyn MarketFeed>) -> Self {
        Self::with_symbols(
            feed,
            TRADING_SYMBOLS.iter().map(|symbol| symbol.to_string()).collect(),
        )
    }

    pub fn with_symbols(feed: Arc<dyn MarketFeed>, symbols: Vec<String>) -> Self {
        let selected_symbol = if symbols.iter().any(|symbol| symbol == DEFAULT_SYMBOL) {
            DEFAULT_SYMBOL.to_string()
        } else {
            symbols
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_SYMBOL.to_string())
        };

        Self {
            feed,
            symbols,
            state: Arc::new(Mutex::new(StoreState {
                quotes: HashMap::new(),
                candles: HashMap::new(),
                pending_candles: HashSet::new(),
                selected_symbol,
                phase: StorePhase::Idle,
                error: None,
            })),
            runtime: Mutex::new(StoreRuntime {
                subscription: None,
                refresh_task: None,
            }),
            cancel_token: CancellationToken::new(),
        }
    }

    pub async fn initialize(&self) {
        load_snapshot(&self.feed, &self.state, &self.symbols).await;
        self.sync_streaming();
        self.ensure_refresh_task();
    }

    pub async fn refresh(&self) {
        load_snapshot(&self.feed, &self.state, &self.symbols).await;
        self.sync_streaming();
    }

    pub fn select_symbol(&self, symbol: &str) {
        let needs_fetch = {
            let mut writable = self.state.lock();
            writable.selected_symbol = symbol.to_string();
            if writable.candles.contains_key(symbol) || writable.pending_candles.contains(symbol)
            {
                false
            } else {
                writable.pending_candles.insert(symbol.to_string());
                true
            }
        };

        if !needs_fetch {
            return;
        }

        let feed = Arc::clone(&self.feed);
        let state = Arc::clone(&self.state);
        let fetch_token = self.cancel_token.clone();
        let symbol = symbol.to_string();

        tokio::spawn(async move {
            let fetched = tokio::select! {
                _ = fetch_token.cancelled() => None,
                result = feed.candle_data(&symbol, DEFAULT_CANDLE_INTERVAL) => Some(result),
            };

            let mut writable = state.lock();
            writable.pending_candles.remove(&symbol);
            match fetched {
                Some(Ok(candles)) => {
                    writable.candles.insert(symbol, candles);
                }
                Some(Err(error)) => {
                    debug!(%symbol, %error, "background candle fetch failed");
                }
                None => {}
            }
        });
    }

    pub fn apply_incoming_quote(&self, quote: Quote) {
        let mut writable = self.state.lock();
        writable.quotes.insert(quote.symbol.clone(), quote);
    }

    pub fn quotes(&self) -> HashMap<String, Quote> {
        self.state.lock().quotes.clone()
    }

    pub fn quote(&self, symbol: &str) -> Option<Quote> {
        self.state.lock().quotes.get(symbol).cloned()
    }

    pub fn selected_quote(&self) -> Option<Quote> {
        let readable = self.state.lock();
        readable.quotes.get(&readable.selected_symbol).cloned()
    }

    pub fn candles(&self, symbol: &str) -> Vec<Candle> {
        self.state.lock().candles.get(symbol).cloned().unwrap_or_default()
    }

    pub fn selected_candles(&self) -> Vec<Candle> {
        let readable = self.state.lock();
        readable
            .candles
            .get(&readable.selected_symbol)
            .cloned()
            .unwrap_or_default()
    }

    pub fn selected_symbol(&self) -> String {
        self.state.lock().selected_symbol.clone()
    }

    pub fn phase(&self) -> StorePhase {
        self.state.lock().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == StorePhase::Loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub async fn shutdown(&self) {
        self.cancel_token.cancel();

        let (subscription, refresh_task) = {
            let mut runtime = self.runtime.lock();
            (runtime.subscription.take(), runtime.refresh_task.take())
        };

        if let Some(subscription) = subscription {
            subscription.cancel();
        }
        if let Some(task) = refresh_task {
            let _ = task.await;
        }
    }

    fn sync_streaming(&self) {
        let has_quotes = !self.state.lock().quotes.is_empty();
        let mut runtime = self.runtime.lock();

        if has_quotes {
            let needs_subscription = runtime
                .subscription
                .as_ref()
                .map_or(true, |subscription| subscription.is_cancelled());
            if needs_subscription && !self.cancel_token.is_cancelled() {
                let sink_state = Arc::clone(&self.state);
                let on_update: QuoteSink = Arc::new(move |quote| {
                    let mut writable = sink_state.lock();
                    writable.quotes.insert(quote.symbol.clone(), quote);
                });
                runtime.subscription = Some(self.feed.subscribe(self.symbols.clone(), on_update));
            }
        } else if let Some(subscription) = runtime.subscription.take() {
            subscription.cancel();
        }
    }

    fn ensure_refresh_task(&self) {
        let mut runtime = self.runtime.lock();
        if runtime.refresh_task.is_some() || self.cancel_token.is_cancelled() {
            return;
        }

        let feed = Arc::clone(&self.feed);
        let state = Arc::clone(&self.state);
        let symbols = self.symbols.clone();
        let refresh_token = self.cancel_token.clone();

        runtime.refresh_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the first interval tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = refresh_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let ready = state.lock().phase == StorePhase::Ready;
                        if ready {
                            load_snapshot(&feed, &state, &symbols).await;
                        }
                    }
                }
            }
        }));
    }
}

async fn load_snapshot(
    feed: &Arc<dyn MarketFeed>,
    state: &Arc<Mutex<StoreState>>,
    symbols: &[String],
) {
    let selected = {
        let mut writable = state.lock();
        writable.phase = StorePhase::Loading;
        writable.error = None;
        writable.selected_symbol.clone()
    };

    let loaded = async {
        let quotes = feed.multiple_market_data(symbols).await?;
        let candles = feed.candle_data(&selected, DEFAULT_CANDLE_INTERVAL).await?;
        Ok::<_, FeedError>((quotes, candles))
    }
    .await;

    match loaded {
        Ok((quotes, candles)) => {
            let mut writable = state.lock();
            for quote in quotes {
                writable.quotes.insert(quote.symbol.clone(), quote);
            }
            writable.candles.insert(selected, candles);
            writable.phase = StorePhase::Ready;
            writable.error = None;
        }
        Err(error) => {
            let mut writable = state.lock();
            writable.phase = StorePhase::Error;
            writable.error = Some(format!("failed to load market data: {error}"));
        }
    }
}
