use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use common::{CandleSeries, Error, Interval, MarketData, Notifier, Result};

/// Scripted market: per-symbol series keyed by interval, per-symbol prices.
#[derive(Default)]
pub struct FakeMarket {
    pub symbols: Vec<String>,
    pub series: HashMap<(String, Interval), CandleSeries>,
    pub prices: HashMap<String, f64>,
    pub universe_down: bool,
    /// When set, `tradable_symbols` waits on this before answering.
    pub gate: Option<Arc<Notify>>,
    pub candle_requests: Mutex<Vec<(String, Interval)>>,
}

impl FakeMarket {
    pub fn with_symbols(symbols: &[&str]) -> Self {
        Self {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn series(mut self, series: CandleSeries) -> Self {
        self.series
            .insert((series.symbol.clone(), series.interval), series);
        self
    }

    pub fn price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    async fn tradable_symbols(&self) -> Result<Vec<String>> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.universe_down {
            return Err(Error::ExchangeStatus {
                status: 503,
                body: "maintenance".into(),
            });
        }
        Ok(self.symbols.clone())
    }

    async fn candles(&self, symbol: &str, interval: Interval, _limit: usize) -> Result<CandleSeries> {
        self.candle_requests
            .lock()
            .await
            .push((symbol.to_string(), interval));
        self.series
            .get(&(symbol.to_string(), interval))
            .cloned()
            .ok_or_else(|| Error::Exchange(format!("Invalid symbol {symbol}")))
    }

    async fn current_price(&self, symbol: &str) -> Result<f64> {
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| Error::Http(format!("ticker timeout for {symbol}")))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub async fn sent(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) {
        self.messages.lock().await.push(text.to_string());
    }
}
