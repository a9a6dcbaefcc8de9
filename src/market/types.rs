use crate::error::FeedError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SYMBOL: &str = "XAUUSD";
pub const DEFAULT_CANDLE_INTERVAL: CandleInterval = CandleInterval::M1;

pub const TRADING_SYMBOLS: [&str; 15] = [
    "XAUUSD", "XAGUSD", "BTCUSD", "ETHUSD", "LTCUSD", "USOIL", "UKOIL", "EURUSD", "GBPUSD",
    "USDJPY", "AUDUSD", "USDCAD", "EURGBP", "EURCHF", "NZDUSD",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CandleInterval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "1d")]
    D1,
}

impl CandleInterval {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::H1 => "1h",
            Self::D1 => "1d",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: String,
    pub high: f64,
    pub low: f64,
    pub open: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

pub fn format_volume(volume: u64) -> String {
    let value = volume as f64;
    if value >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        volume.to_string()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChartEnvelopeWire {
    pub chart: Option<ChartWire>,
}

#[derive(Debug, Deserialize)]
pub struct ChartWire {
    pub result: Option<Vec<ChartResultWire>>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResultWire {
    pub meta: ChartMetaWire,
    pub timestamp: Option<Vec<i64>>,
    pub indicators: ChartIndicatorsWire,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetaWire {
    pub symbol: Option<String>,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub regular_market_volume: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ChartIndicatorsWire {
    pub quote: Option<Vec<QuoteSeriesWire>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteSeriesWire {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

pub fn parse_chart_payload(payload: &mut [u8]) -> Result<ChartResultWire, FeedError> {
    let envelope: ChartEnvelopeWire = simd_json::serde::from_slice(payload)?;
    envelope
        .chart
        .and_then(|chart| chart.result)
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.remove(0))
            }
        })
        .ok_or_else(|| FeedError::UpstreamMalformed("missing chart result container".to_string()))
}

impl ChartResultWire {
    fn into_parts(self) -> Result<(ChartMetaWire, Vec<i64>, QuoteSeriesWire), FeedError> {
        let series = self
            .indicators
            .quote
            .and_then(|mut series| {
                if series.is_empty() {
                    None
                } else {
                    Some(series.remove(0))
                }
            })
            .ok_or_else(|| FeedError::UpstreamMalformed("missing quote series".to_string()))?;
        let timestamps = self
            .timestamp
            .filter(|timestamps| !timestamps.is_empty())
            .ok_or_else(|| FeedError::UpstreamMalformed("missing timestamp series".to_string()))?;
        Ok((self.meta, timestamps, series))
    }

    pub fn into_quote(self, symbol: &str) -> Result<Quote, FeedError> {
        let (meta, _timestamps, series) = self.into_parts()?;

        let last_close = series.close.iter().rev().find_map(|close| *close);
        let price = meta
            .regular_market_price
            .or(last_close)
            .ok_or_else(|| FeedError::UpstreamMalformed("no live price or close series".to_string()))?;
        let previous_close = meta
            .previous_close
            .ok_or_else(|| FeedError::UpstreamMalformed("missing previous close".to_string()))?;

        if !price.is_finite() || !previous_close.is_finite() {
            return Err(FeedError::UpstreamMalformed(
                "price values must be finite".to_string(),
            ));
        }

        let change = price - previous_close;
        let change_percent = change / previous_close * 100.0;

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            change,
            change_percent,
            volume: format_volume(meta.regular_market_volume.unwrap_or(0)),
            high: meta.regular_market_day_high.unwrap_or(price),
            low: meta.regular_market_day_low.unwrap_or(price),
            open: series.open.first().copied().flatten().unwrap_or(price),
        })
    }

    pub fn into_candles(self) -> Result<Vec<Candle>, FeedError> {
        let (_meta, timestamps, series) = self.into_parts()?;

        let mut candles = Vec::with_capacity(timestamps.len());
        for (index, epoch_seconds) in timestamps.iter().enumerate() {
            let row = (
                series.open.get(index).copied().flatten(),
                series.high.get(index).copied().flatten(),
                series.low.get(index).copied().flatten(),
                series.close.get(index).copied().flatten(),
            );
            let (Some(open), Some(high), Some(low), Some(close)) = row else {
                continue;
            };
            let Some(time) = DateTime::<Utc>::from_timestamp(*epoch_seconds, 0) else {
                continue;
            };
            candles.push(Candle {
                time,
                open,
                high,
                low,
                close,
                volume: series.volume.get(index).copied().flatten().unwrap_or(0),
            });
        }

        Ok(candles)
    }
}
