use chrono::Utc;
use tracing::debug;

use common::{CandleSeries, SignalVerdict};

use crate::bundle::{Indicator, IndicatorBundle, MIN_BARS};
use crate::config::ScreeningConfig;
use crate::gates::GateError;

/// The five independent checks behind the "needed" verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// ma10 > ma20 > ma50
    TrendStack,
    /// Conversion above base line, close above the whole cloud.
    Ichimoku,
    /// MACD above signal with a positive, rising histogram.
    MacdMomentum,
    RsiStrength,
    /// +DI above −DI with a trending ADX.
    DmiTrend,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::TrendStack,
        Condition::Ichimoku,
        Condition::MacdMomentum,
        Condition::RsiStrength,
        Condition::DmiTrend,
    ];
}

/// Multi-factor screening gate: passes when at least `quorum` of the five
/// conditions hold on the latest bar.
#[derive(Debug, Clone, Default)]
pub struct ScreeningGate {
    cfg: ScreeningConfig,
}

impl ScreeningGate {
    pub fn new(cfg: ScreeningConfig) -> Self {
        Self { cfg }
    }

    /// Evaluate a single condition. Undefined (`NaN`) inputs make it false.
    pub fn check(
        &self,
        condition: Condition,
        series: &CandleSeries,
        bundle: &IndicatorBundle,
    ) -> Result<bool, GateError> {
        use Indicator::*;

        let held = match condition {
            Condition::TrendStack => {
                let (ma10, ma20, ma50) =
                    (bundle.latest(Ma10)?, bundle.latest(Ma20)?, bundle.latest(Ma50)?);
                debug!(ma10, ma20, ma50, "trend stack");
                ma10 > ma20 && ma20 > ma50
            }
            Condition::Ichimoku => {
                let tenkan = bundle.latest(Tenkan)?;
                let kijun = bundle.latest(Kijun)?;
                let span_a = bundle.latest(SenkouA)?;
                let span_b = bundle.latest(SenkouB)?;
                let close = series.from_end(0).map_or(f64::NAN, |c| c.close);
                debug!(tenkan, kijun, span_a, span_b, close, "ichimoku");
                // Both spans compared separately: f64::max would hide a NaN.
                tenkan > kijun && close > span_a && close > span_b
            }
            Condition::MacdMomentum => {
                let macd = bundle.latest(MacdLine)?;
                let signal = bundle.latest(MacdSignal)?;
                let hist = bundle.latest(MacdHistogram)?;
                let prev_hist = bundle.at(MacdHistogram, 1)?;
                debug!(macd, signal, hist, prev_hist, "macd");
                macd > signal && hist > 0.0 && hist > prev_hist
            }
            Condition::RsiStrength => {
                let rsi = bundle.latest(Rsi)?;
                debug!(rsi, threshold = self.cfg.rsi_threshold, "rsi");
                rsi > self.cfg.rsi_threshold
            }
            Condition::DmiTrend => {
                let plus = bundle.latest(PlusDi)?;
                let minus = bundle.latest(MinusDi)?;
                let adx = bundle.latest(Adx)?;
                debug!(plus, minus, adx, "dmi");
                plus > minus && adx > self.cfg.adx_threshold
            }
        };
        Ok(held)
    }

    /// Count satisfied conditions and apply the quorum.
    ///
    /// An empty bundle is reported as [`GateError::DataUnavailable`]; a bundle
    /// lacking one of the required series as [`GateError::IndicatorIncomplete`].
    pub fn evaluate(
        &self,
        series: &CandleSeries,
        bundle: &IndicatorBundle,
    ) -> Result<SignalVerdict, GateError> {
        if bundle.is_empty() {
            return Err(GateError::DataUnavailable {
                bars: series.len(),
                required: MIN_BARS,
            });
        }

        let mut satisfied_count = 0;
        for condition in Condition::ALL {
            if self.check(condition, series, bundle)? {
                satisfied_count += 1;
            }
        }
        let passed = satisfied_count >= self.cfg.quorum;

        debug!(
            symbol = %series.symbol,
            satisfied = satisfied_count,
            quorum = self.cfg.quorum,
            passed,
            "screening verdict"
        );

        Ok(SignalVerdict {
            symbol: series.symbol.clone(),
            passed,
            satisfied_count,
            checked_at: Utc::now(),
        })
    }

    /// Fail-closed boolean form of [`evaluate`](Self::evaluate).
    pub fn passes(&self, series: &CandleSeries, bundle: &IndicatorBundle) -> bool {
        self.evaluate(series, bundle).map(|v| v.passed).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::IndicatorCalculator;
    use crate::testutil::{flat_series, series_from_closes, uptrend_series};

    /// Two-bar bundle where each condition can be switched on or off.
    fn bundle_with(on: [bool; 5]) -> IndicatorBundle {
        let [stack, ichimoku, macd, rsi, dmi] = on;
        let pick = |cond: bool, yes: f64, no: f64| if cond { yes } else { no };
        [
            (Indicator::Ma10, vec![0.0, pick(stack, 30.0, 10.0)]),
            (Indicator::Ma20, vec![0.0, 20.0]),
            (Indicator::Ma50, vec![0.0, pick(stack, 10.0, 30.0)]),
            (Indicator::Tenkan, vec![0.0, pick(ichimoku, 12.0, 8.0)]),
            (Indicator::Kijun, vec![0.0, 10.0]),
            (Indicator::SenkouA, vec![0.0, 50.0]),
            (Indicator::SenkouB, vec![0.0, 60.0]),
            (Indicator::MacdLine, vec![0.0, 2.0]),
            (Indicator::MacdSignal, vec![0.0, 1.0]),
            (Indicator::MacdHistogram, vec![0.5, pick(macd, 1.0, 0.2)]),
            (Indicator::Rsi, vec![0.0, pick(rsi, 60.0, 40.0)]),
            (Indicator::PlusDi, vec![0.0, 30.0]),
            (Indicator::MinusDi, vec![0.0, 10.0]),
            (Indicator::Adx, vec![0.0, pick(dmi, 25.0, 15.0)]),
        ]
        .into_iter()
        .collect()
    }

    fn two_bar_series() -> CandleSeries {
        series_from_closes("TESTUSDT", &[90.0, 100.0])
    }

    #[test]
    fn four_of_five_passes() {
        let gate = ScreeningGate::default();
        for off in 0..5 {
            let mut on = [true; 5];
            on[off] = false;
            let verdict = gate.evaluate(&two_bar_series(), &bundle_with(on)).unwrap();
            assert_eq!(verdict.satisfied_count, 4);
            assert!(verdict.passed, "condition {off} off should still pass");
        }
    }

    #[test]
    fn three_of_five_fails() {
        let gate = ScreeningGate::default();
        let verdict = gate
            .evaluate(&two_bar_series(), &bundle_with([true, false, true, false, true]))
            .unwrap();
        assert_eq!(verdict.satisfied_count, 3);
        assert!(!verdict.passed);
    }

    #[test]
    fn missing_indicator_fails_closed() {
        let gate = ScreeningGate::default();
        let bundle: IndicatorBundle = [(Indicator::Ma10, vec![1.0, 2.0])].into_iter().collect();
        assert_eq!(
            gate.evaluate(&two_bar_series(), &bundle).unwrap_err(),
            GateError::IndicatorIncomplete(Indicator::Ma20)
        );
        assert!(!gate.passes(&two_bar_series(), &bundle));
    }

    #[test]
    fn short_series_is_data_unavailable() {
        let series = flat_series(30, 100.0);
        let bundle = IndicatorCalculator::default().compute(&series);
        let gate = ScreeningGate::default();
        assert_eq!(
            gate.evaluate(&series, &bundle).unwrap_err(),
            GateError::DataUnavailable { bars: 30, required: MIN_BARS }
        );
        assert!(!gate.passes(&series, &bundle));
    }

    #[test]
    fn nan_cloud_never_satisfies_ichimoku() {
        let gate = ScreeningGate::default();
        let base = bundle_with([true; 5]);
        let bundle: IndicatorBundle = Indicator::ALL
            .into_iter()
            .filter_map(|i| {
                let mut values = base.get(i)?.to_vec();
                if i == Indicator::SenkouB {
                    values[1] = f64::NAN;
                }
                Some((i, values))
            })
            .collect();
        let ok = gate
            .check(Condition::Ichimoku, &two_bar_series(), &bundle)
            .unwrap();
        assert!(!ok);
    }

    #[test]
    fn flat_market_fails_with_rsi_exactly_50() {
        let series = flat_series(50, 100.0);
        let bundle = IndicatorCalculator::default().compute(&series);
        assert_eq!(bundle.latest(Indicator::Rsi).unwrap(), 50.0);

        let gate = ScreeningGate::default();
        assert!(!gate.check(Condition::RsiStrength, &series, &bundle).unwrap());
        let verdict = gate.evaluate(&series, &bundle).unwrap();
        assert_eq!(verdict.satisfied_count, 0);
        assert!(!verdict.passed);
    }

    #[test]
    fn uptrend_after_flat_base_passes() {
        let series = uptrend_series("UPUSDT");
        let bundle = IndicatorCalculator::default().compute(&series);
        let gate = ScreeningGate::default();

        // 50 bars leave the projected cloud undefined, the other four hold.
        assert!(!gate.check(Condition::Ichimoku, &series, &bundle).unwrap());
        let verdict = gate.evaluate(&series, &bundle).unwrap();
        assert_eq!(verdict.satisfied_count, 4);
        assert!(verdict.passed);
    }

    #[test]
    fn verdict_is_repeatable() {
        let series = uptrend_series("UPUSDT");
        let bundle = IndicatorCalculator::default().compute(&series);
        let gate = ScreeningGate::default();
        let a = gate.evaluate(&series, &bundle).unwrap();
        let b = gate.evaluate(&series, &bundle).unwrap();
        assert_eq!((a.passed, a.satisfied_count), (b.passed, b.satisfied_count));
    }

    #[test]
    fn lower_rsi_threshold_is_configurable() {
        let gate = ScreeningGate::new(ScreeningConfig {
            rsi_threshold: 30.0,
            ..ScreeningConfig::default()
        });
        let series = two_bar_series();
        let bundle = bundle_with([true, true, true, false, true]); // rsi = 40
        assert!(gate.check(Condition::RsiStrength, &series, &bundle).unwrap());
    }
}
