use crate::market::types::{format_volume, Candle, Quote};
use chrono::{TimeDelta, Utc};
use rand::Rng;

pub const SYNTHETIC_CANDLE_COUNT: usize = 100;
pub const FALLBACK_BASE_PRICE: f64 = 100.0;

pub type BasePriceTable = &'static [(&'static str, f64)];

pub const DEFAULT_BASE_PRICES: BasePriceTable = &[
    ("XAUUSD", 3_312.0),
    ("XAGUSD", 38.0),
    ("BTCUSD", 118_000.0),
    ("ETHUSD", 3_800.0),
    ("LTCUSD", 110.0),
    ("USOIL", 66.0),
    ("UKOIL", 70.0),
    ("EURUSD", 1.15),
    ("GBPUSD", 1.35),
    ("USDJPY", 149.0),
    ("AUDUSD", 0.65),
    ("USDCAD", 1.37),
    ("EURGBP", 0.86),
    ("EURCHF", 0.93),
    ("NZDUSD", 0.60),
];

#[derive(Debug, Clone)]
pub struct SyntheticQuoteGenerator {
    base_prices: BasePriceTable,
}

impl SyntheticQuoteGenerator {
    pub fn new() -> Self {
        Self::with_base_prices(DEFAULT_BASE_PRICES)
    }

    pub fn with_base_prices(base_prices: BasePriceTable) -> Self {
        Self { base_prices }
    }

    pub fn base_price(&self, symbol: &str) -> f64 {
        self.base_prices
            .iter()
            .find(|(known, _)| *known == symbol)
            .map(|(_, base)| *base)
            .unwrap_or(FALLBACK_BASE_PRICE)
    }

    pub fn quote(&self, symbol: &str) -> Quote {
        let base = self.base_price(symbol);
        let mut rng = rand::rng();

        let change = (rng.random::<f64>() - 0.5) * base * 0.02;
        let price = base + change;

        Quote {
            symbol: symbol.to_string(),
            price,
            change,
            change_percent: change / base * 100.0,
            volume: format_volume(rng.random_range(0..1_000_000)),
            high: price + change.abs() * 1.5,
            low: price - change.abs() * 1.5,
            open: base,
        }
    }

    pub fn candles(&self, symbol: &str, count: usize) -> Vec<Candle> {
        let base = self.base_price(symbol);
        let mut rng = rand::rng();
        let start = Utc::now() - TimeDelta::hours(2);

        let mut candles = Vec::with_capacity(count);
        for step in 0..count {
            let open = base + (rng.random::<f64>() - 0.5) * base * 0.04;
            let volatility = base * 0.005;
            let high = open + rng.random::<f64>() * volatility;
            let low = open - rng.random::<f64>() * volatility;
            let close = low + rng.random::<f64>() * (high - low);

            candles.push(Candle {
                time: start + TimeDelta::minutes(step as i64),
                open,
                high,
                low,
                close,
                volume: rng.random_range(0..10_000),
            });
        }

        candles
    }
}

impl Default for SyntheticQuoteGenerator {
    fn default() -> Self {
        Self::new()
    }
}
