use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use common::{
    CandleSeries, Gate, Interval, MarketData, NeededSet, Notifier, PassReport, Result,
    SignalStore,
};
use strategy::{
    ConfirmationGate, GateError, IndicatorBundle, IndicatorCalculator, ScanConfig,
    ScoutFileConfig, ScreeningGate,
};

/// Drives one full screening or confirmation pass over the symbol universe.
///
/// Symbols are evaluated one at a time. Anything that goes wrong for a single
/// symbol is logged and counted as skipped or failed; only losing the
/// universe listing or the store aborts a pass.
pub struct UniverseScanner {
    market: Arc<dyn MarketData>,
    store: Arc<dyn SignalStore>,
    notifier: Arc<dyn Notifier>,
    calculator: IndicatorCalculator,
    screening: ScreeningGate,
    confirmation: ConfirmationGate,
    scan: ScanConfig,
}

/// Per-symbol result inside a pass.
enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl UniverseScanner {
    pub fn new(
        market: Arc<dyn MarketData>,
        store: Arc<dyn SignalStore>,
        notifier: Arc<dyn Notifier>,
        cfg: &ScoutFileConfig,
    ) -> Self {
        Self {
            market,
            store,
            notifier,
            calculator: IndicatorCalculator::default(),
            screening: ScreeningGate::new(cfg.screening.clone()),
            confirmation: ConfirmationGate::new(cfg.confirmation.clone()),
            scan: cfg.scan.clone(),
        }
    }

    pub fn in_scope(&self, symbol: &str) -> bool {
        symbol.ends_with(&self.scan.quote_asset)
    }

    /// Screen every in-scope symbol, replace the stored needed set with the
    /// survivors and notify the operator.
    pub async fn needed_pass(&self) -> Result<PassReport> {
        info!("Starting needed pass");
        let mut symbols: Vec<String> = self
            .market
            .tradable_symbols()
            .await?
            .into_iter()
            .filter(|s| self.in_scope(s))
            .collect();
        symbols.sort();
        symbols.dedup();
        info!(count = symbols.len(), quote = %self.scan.quote_asset, "Screening universe");

        let mut passed = Vec::new();
        let (mut evaluated, mut skipped) = (0, 0);
        for symbol in &symbols {
            match self.screen(symbol).await {
                Outcome::Passed => {
                    evaluated += 1;
                    passed.push(symbol.clone());
                }
                Outcome::Failed => evaluated += 1,
                Outcome::Skipped => skipped += 1,
            }
        }

        let set: NeededSet = passed.iter().cloned().collect();
        self.store.save_needed(&set).await?;

        let report = PassReport {
            gate: Gate::Needed,
            evaluated,
            skipped,
            passed,
            finished_at: Utc::now(),
        };
        info!(
            evaluated,
            skipped,
            passed = report.passed.len(),
            "Needed pass complete"
        );
        self.notifier.notify(&report.message()).await;
        Ok(report)
    }

    /// Confirm the stored needed set against fresh candles and live quotes.
    pub async fn sufficient_pass(&self) -> Result<PassReport> {
        info!("Starting sufficient pass");
        let needed = self.store.load_needed().await?;
        if needed.is_empty() {
            info!("Needed set is empty, nothing to confirm");
        }

        let mut passed = Vec::new();
        let (mut evaluated, mut skipped) = (0, 0);
        for symbol in needed.iter() {
            if !self.in_scope(symbol) {
                warn!(symbol = %symbol, "Stored needed symbol outside quote asset, ignoring");
                skipped += 1;
                continue;
            }
            match self.confirm(symbol).await {
                Outcome::Passed => {
                    evaluated += 1;
                    passed.push(symbol.clone());
                }
                Outcome::Failed => evaluated += 1,
                Outcome::Skipped => skipped += 1,
            }
        }

        let report = PassReport {
            gate: Gate::Sufficient,
            evaluated,
            skipped,
            passed,
            finished_at: Utc::now(),
        };
        info!(
            evaluated,
            skipped,
            passed = report.passed.len(),
            "Sufficient pass complete"
        );
        self.notifier.notify(&report.message()).await;
        Ok(report)
    }

    async fn screen(&self, symbol: &str) -> Outcome {
        let Some((series, bundle)) = self.prepare(symbol, self.scan.needed_interval).await else {
            return Outcome::Skipped;
        };
        match self.screening.evaluate(&series, &bundle) {
            Ok(verdict) if verdict.passed => {
                info!(symbol, satisfied = verdict.satisfied_count, "Needed conditions met");
                Outcome::Passed
            }
            Ok(verdict) => {
                info!(symbol, satisfied = verdict.satisfied_count, "Needed conditions not met");
                Outcome::Failed
            }
            Err(e) => {
                warn!(symbol, error = %e, "Screening failed closed");
                Outcome::Failed
            }
        }
    }

    async fn confirm(&self, symbol: &str) -> Outcome {
        let Some((series, bundle)) = self.prepare(symbol, self.scan.sufficient_interval).await
        else {
            return Outcome::Skipped;
        };
        let quote = self.market.current_price(symbol).await;
        match self.confirmation.evaluate(&series, &bundle, quote) {
            Ok(verdict) if verdict.passed => {
                info!(symbol, "Sufficient conditions met");
                Outcome::Passed
            }
            Ok(_) => {
                info!(symbol, "Sufficient conditions not met");
                Outcome::Failed
            }
            Err(e @ GateError::LiveQuote(_)) => {
                warn!(symbol, error = %e, "Live price unavailable, confirmation failed closed");
                Outcome::Failed
            }
            Err(e) => {
                warn!(symbol, error = %e, "Confirmation failed closed");
                Outcome::Failed
            }
        }
    }

    /// Fetch candles and compute indicators, or `None` when the symbol has to
    /// be skipped for lack of data.
    async fn prepare(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Option<(CandleSeries, IndicatorBundle)> {
        let series = match self
            .market
            .candles(symbol, interval, self.scan.candle_limit)
            .await
        {
            Ok(series) => series,
            Err(e) => {
                warn!(symbol, %interval, error = %e, "Candle fetch failed");
                CandleSeries::empty(symbol, interval)
            }
        };
        if series.is_empty() {
            warn!(symbol, %interval, "No candle data, skipping");
            return None;
        }

        let bundle = self.calculator.compute(&series);
        if bundle.is_empty() {
            warn!(symbol, bars = series.len(), "Not enough history for indicators, skipping");
            return None;
        }
        Some((series, bundle))
    }
}
