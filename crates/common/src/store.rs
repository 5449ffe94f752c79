use async_trait::async_trait;

use crate::{Holding, NeededSet, Result};

/// Durable state shared between passes.
///
/// Only the latest needed set is kept: `save_needed` replaces whatever was
/// stored before, atomically.
#[async_trait]
pub trait SignalStore: Send + Sync {
    async fn load_needed(&self) -> Result<NeededSet>;

    async fn save_needed(&self, set: &NeededSet) -> Result<()>;

    /// All recorded holdings, ordered by symbol.
    async fn holdings(&self) -> Result<Vec<Holding>>;

    /// Insert or overwrite the bought price for `symbol`.
    async fn record_holding(&self, symbol: &str, bought_price: f64) -> Result<()>;

    /// Returns `true` if a holding was removed.
    async fn remove_holding(&self, symbol: &str) -> Result<bool>;
}
