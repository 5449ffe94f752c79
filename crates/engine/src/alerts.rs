use std::sync::Arc;

use tracing::{info, warn};

use common::{MarketData, Notifier, Result, SignalStore};

/// Watches recorded bought prices and reports holdings that have risen past
/// the configured threshold.
pub struct PriceAlertChecker {
    market: Arc<dyn MarketData>,
    store: Arc<dyn SignalStore>,
    notifier: Arc<dyn Notifier>,
    rise_pct: f64,
}

impl PriceAlertChecker {
    pub fn new(
        market: Arc<dyn MarketData>,
        store: Arc<dyn SignalStore>,
        notifier: Arc<dyn Notifier>,
        rise_pct: f64,
    ) -> Self {
        Self {
            market,
            store,
            notifier,
            rise_pct,
        }
    }

    /// Check every holding once. Returns the alert lines that were sent.
    pub async fn check(&self) -> Result<Vec<String>> {
        let holdings = self.store.holdings().await?;
        let mut alerts = Vec::new();

        for holding in &holdings {
            let price = match self.market.current_price(&holding.symbol).await {
                Ok(p) => p,
                Err(e) => {
                    warn!(symbol = %holding.symbol, error = %e, "Price lookup failed, skipping holding");
                    continue;
                }
            };
            if price > holding.bought_price * (1.0 + self.rise_pct) {
                let gain = (price / holding.bought_price - 1.0) * 100.0;
                alerts.push(format!(
                    "Token {} rose to {price} (+{gain:.1}% over bought price {})",
                    holding.symbol, holding.bought_price
                ));
            }
        }

        info!(holdings = holdings.len(), alerts = alerts.len(), "Holding check complete");
        if !alerts.is_empty() {
            self.notifier.notify(&alerts.join("\n")).await;
        }
        Ok(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeMarket, RecordingNotifier};
    use store::MemoryStore;

    #[tokio::test]
    async fn alerts_only_above_threshold() {
        let store = MemoryStore::new();
        store.record_holding("BTCUSDT", 100.0).await.unwrap();
        store.record_holding("ETHUSDT", 100.0).await.unwrap();
        store.record_holding("ADAUSDT", 100.0).await.unwrap(); // no price

        let market = FakeMarket::with_symbols(&[])
            .price("BTCUSDT", 125.0)
            .price("ETHUSDT", 110.0);
        let notifier = Arc::new(RecordingNotifier::default());
        let checker = PriceAlertChecker::new(
            Arc::new(market),
            Arc::new(store),
            notifier.clone(),
            0.2,
        );

        let alerts = checker.check().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(
            alerts[0],
            "Token BTCUSDT rose to 125 (+25.0% over bought price 100)"
        );
        assert_eq!(notifier.sent().await, alerts);
    }

    #[tokio::test]
    async fn no_holdings_sends_nothing() {
        let notifier = Arc::new(RecordingNotifier::default());
        let checker = PriceAlertChecker::new(
            Arc::new(FakeMarket::default()),
            Arc::new(MemoryStore::new()),
            notifier.clone(),
            0.2,
        );
        assert!(checker.check().await.unwrap().is_empty());
        assert!(notifier.sent().await.is_empty());
    }
}
