use crate::error::FeedError;
use crate::market::types::{parse_chart_payload, Candle, CandleInterval, ChartResultWire, Quote};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_PROXY_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
const CHART_RANGE: &str = "1d";

pub type SymbolMap = &'static [(&'static str, &'static str)];

pub const DEFAULT_SYMBOL_MAP: SymbolMap = &[
    ("XAUUSD", "GC=F"),
    ("XAGUSD", "SI=F"),
    ("BTCUSD", "BTC-USD"),
    ("ETHUSD", "ETH-USD"),
    ("LTCUSD", "LTC-USD"),
    ("USOIL", "CL=F"),
    ("UKOIL", "BZ=F"),
    ("EURUSD", "EURUSD=X"),
    ("GBPUSD", "GBPUSD=X"),
    ("USDJPY", "USDJPY=X"),
    ("AUDUSD", "AUDUSD=X"),
    ("USDCAD", "USDCAD=X"),
    ("EURGBP", "EURGBP=X"),
    ("EURCHF", "EURCHF=X"),
    ("NZDUSD", "NZDUSD=X"),
];

#[derive(Debug, Clone)]
pub struct QuoteFetcher {
    client: Client,
    base_url: String,
    symbol_map: SymbolMap,
}

impl QuoteFetcher {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_PROXY_BASE_URL, DEFAULT_SYMBOL_MAP)
    }

    pub fn with_endpoint(base_url: impl Into<String>, symbol_map: SymbolMap) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            symbol_map,
        }
    }

    pub fn upstream_symbol<'a>(&self, symbol: &'a str) -> &'a str {
        self.symbol_map
            .iter()
            .find(|(internal, _)| *internal == symbol)
            .map(|(_, upstream)| *upstream)
            .unwrap_or(symbol)
    }

    fn chart_endpoint(&self, symbol: &str, interval: CandleInterval) -> String {
        format!(
            "{}/{}?interval={}&range={CHART_RANGE}",
            self.base_url,
            self.upstream_symbol(symbol),
            interval.as_str()
        )
    }

    pub async fn fetch(&self, symbol: &str) -> Result<Quote, FeedError> {
        let chart = self.fetch_chart(symbol, CandleInterval::M1).await?;
        chart.into_quote(symbol)
    }

    pub async fn fetch_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, FeedError> {
        let chart = self.fetch_chart(symbol, interval).await?;
        chart.into_candles()
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        interval: CandleInterval,
    ) -> Result<ChartResultWire, FeedError> {
        let endpoint = self.chart_endpoint(symbol, interval);
        let response = self
            .client
            .get(endpoint)
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let mut payload = response.bytes().await?.to_vec();
        parse_chart_payload(&mut payload)
    }
}

impl Default for QuoteFetcher {
    fn default() -> Self {
        Self::new()
    }
}
