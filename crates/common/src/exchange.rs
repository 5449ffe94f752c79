use async_trait::async_trait;

use crate::{CandleSeries, Interval, Result};

/// Read-only market data source.
///
/// `BinanceClient` in `crates/engine` implements this against the public REST
/// API. The scanner is the only consumer; tests substitute in-memory fakes.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Every symbol currently open for trading, regardless of quote asset.
    async fn tradable_symbols(&self) -> Result<Vec<String>>;

    /// Up to `limit` closed candles for `symbol`, oldest first. The bar still
    /// in progress is never included; the live price stands in for it.
    async fn candles(&self, symbol: &str, interval: Interval, limit: usize)
        -> Result<CandleSeries>;

    /// Latest traded price for `symbol`.
    async fn current_price(&self, symbol: &str) -> Result<f64>;
}
