use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use common::{Holding, NeededSet, Result, SignalStore};

/// In-process store. State is lost on restart; used for tests and for
/// running without a database (`STORE=memory`).
#[derive(Clone, Default)]
pub struct MemoryStore {
    needed: Arc<RwLock<NeededSet>>,
    holdings: Arc<RwLock<BTreeMap<String, Holding>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a needed set.
    pub fn with_needed(set: NeededSet) -> Self {
        Self {
            needed: Arc::new(RwLock::new(set)),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn load_needed(&self) -> Result<NeededSet> {
        Ok(self.needed.read().await.clone())
    }

    async fn save_needed(&self, set: &NeededSet) -> Result<()> {
        *self.needed.write().await = set.clone();
        debug!(count = set.len(), "Needed set saved (memory)");
        Ok(())
    }

    async fn holdings(&self) -> Result<Vec<Holding>> {
        Ok(self.holdings.read().await.values().cloned().collect())
    }

    async fn record_holding(&self, symbol: &str, bought_price: f64) -> Result<()> {
        self.holdings.write().await.insert(
            symbol.to_string(),
            Holding {
                symbol: symbol.to_string(),
                bought_price,
                recorded_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn remove_holding(&self, symbol: &str) -> Result<bool> {
        Ok(self.holdings.write().await.remove(symbol).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_returns_saved_set() {
        let store = MemoryStore::new();
        let set: NeededSet = ["ETHUSDT", "BTCUSDT"].into_iter().collect();
        store.save_needed(&set).await.unwrap();
        assert_eq!(store.load_needed().await.unwrap(), set);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.record_holding("BTCUSDT", 1.0).await.unwrap();
        assert_eq!(other.holdings().await.unwrap().len(), 1);
    }
}
