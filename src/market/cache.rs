use crate::market::types::Quote;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const QUOTE_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct CacheEntry {
    quote: Quote,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct QuoteCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::with_ttl(QUOTE_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<Quote> {
        let entries = self.entries.lock();
        entries
            .get(symbol)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.quote.clone())
    }

    pub fn put(&self, quote: Quote) {
        let mut entries = self.entries.lock();
        entries.insert(
            quote.symbol.clone(),
            CacheEntry {
                quote,
                fetched_at: Instant::now(),
            },
        );
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quote(symbol: &str, price: f64) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            price,
            change: 1.0,
            change_percent: 0.5,
            volume: "1.2M".to_string(),
            high: price + 2.0,
            low: price - 2.0,
            open: price - 1.0,
        }
    }

    #[test]
    fn returns_identical_quote_within_ttl() {
        let cache = QuoteCache::new();
        cache.put(sample_quote("XAUUSD", 3312.0));

        let first = cache.get("XAUUSD").expect("entry should be fresh");
        let second = cache.get("XAUUSD").expect("entry should still be fresh");
        assert_eq!(first, second);
    }

    #[test]
    fn reports_absent_after_ttl_expiry() {
        let cache = QuoteCache::with_ttl(Duration::ZERO);
        cache.put(sample_quote("XAUUSD", 3312.0));
        assert!(cache.get("XAUUSD").is_none());
    }

    #[test]
    fn reports_absent_for_unknown_symbol() {
        let cache = QuoteCache::new();
        assert!(cache.get("BTCUSD").is_none());
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let cache = QuoteCache::new();
        cache.put(sample_quote("BTCUSD", 118_000.0));
        cache.put(sample_quote("BTCUSD", 118_500.0));

        let cached = cache.get("BTCUSD").expect("entry should be fresh");
        assert_eq!(cached.price, 118_500.0);
    }
}
