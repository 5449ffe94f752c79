use chrono::Utc;
use tracing::debug;

use common::{CandleSeries, SignalVerdict};

use crate::bundle::{Indicator, IndicatorBundle, MIN_BARS};
use crate::config::ConfirmationConfig;
use crate::gates::GateError;

/// Volume and breakout confirmation over a symbol already on the needed list.
///
/// Passes when volume on the latest bar is elevated and the live quote has
/// crossed back above ma10 after the last closed bar(s) finished below it.
/// With `surge_clause` enabled, a sharp volume surge with the quote above the
/// last close also passes.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationGate {
    cfg: ConfirmationConfig,
}

impl ConfirmationGate {
    pub fn new(cfg: ConfirmationConfig) -> Self {
        Self { cfg }
    }

    /// Evaluate against the freshest quote. A failed or non-finite quote
    /// fails the gate before any indicator is read.
    pub fn evaluate(
        &self,
        series: &CandleSeries,
        bundle: &IndicatorBundle,
        quote: common::Result<f64>,
    ) -> Result<SignalVerdict, GateError> {
        let price = match quote {
            Ok(p) if p.is_finite() && p > 0.0 => p,
            Ok(p) => return Err(GateError::LiveQuote(format!("unusable price {p}"))),
            Err(e) => return Err(GateError::LiveQuote(e.to_string())),
        };

        if bundle.is_empty() {
            return Err(GateError::DataUnavailable {
                bars: series.len(),
                required: MIN_BARS,
            });
        }

        let last = series.from_end(0);
        let volume = last.map_or(f64::NAN, |c| c.volume);
        let last_close = last.map_or(f64::NAN, |c| c.close);
        let volume_ma50 = bundle.latest(Indicator::VolumeMa50)?;
        let volume_ma10 = bundle.latest(Indicator::VolumeMa10)?;
        let ma10 = bundle.latest(Indicator::Ma10)?;

        let sharp_surge = self.cfg.surge_clause && volume >= self.cfg.surge_multiplier * volume_ma10;
        let volume_ok = volume >= self.cfg.volume_multiplier * volume_ma50 || sharp_surge;

        let mut closed_below = true;
        for back in 0..self.cfg.breakout_lookback.max(1) {
            let close = series.from_end(back).map_or(f64::NAN, |c| c.close);
            let avg = bundle.at(Indicator::Ma10, back)?;
            closed_below &= close < avg;
        }
        let breakout = closed_below && price > ma10;

        let passed = (volume_ok && breakout) || (sharp_surge && price > last_close);

        debug!(
            symbol = %series.symbol,
            volume,
            volume_ma50,
            volume_ma10,
            ma10,
            price,
            last_close,
            volume_ok,
            breakout,
            sharp_surge,
            passed,
            "confirmation verdict"
        );

        Ok(SignalVerdict {
            symbol: series.symbol.clone(),
            passed,
            satisfied_count: usize::from(volume_ok) + usize::from(breakout),
            checked_at: Utc::now(),
        })
    }

    /// Fail-closed boolean form of [`evaluate`](Self::evaluate).
    pub fn passes(
        &self,
        series: &CandleSeries,
        bundle: &IndicatorBundle,
        quote: common::Result<f64>,
    ) -> bool {
        self.evaluate(series, bundle, quote)
            .map(|v| v.passed)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::IndicatorCalculator;
    use crate::testutil::{flat_series, pullback_series, uptrend_series};

    fn gate_with(cfg: ConfirmationConfig) -> ConfirmationGate {
        ConfirmationGate::new(cfg)
    }

    #[test]
    fn cross_above_ma10_on_heavy_volume_passes() {
        let series = pullback_series("UPUSDT");
        let bundle = IndicatorCalculator::default().compute(&series);
        let verdict = ConfirmationGate::default()
            .evaluate(&series, &bundle, Ok(150.0))
            .unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.satisfied_count, 2);
    }

    #[test]
    fn quote_below_ma10_is_no_breakout() {
        let series = pullback_series("UPUSDT");
        let bundle = IndicatorCalculator::default().compute(&series);
        let verdict = ConfirmationGate::default()
            .evaluate(&series, &bundle, Ok(140.0))
            .unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.satisfied_count, 1);
    }

    #[test]
    fn quote_failure_fails_closed() {
        let series = pullback_series("UPUSDT");
        let bundle = IndicatorCalculator::default().compute(&series);
        let gate = ConfirmationGate::default();
        let err = gate
            .evaluate(
                &series,
                &bundle,
                Err(common::Error::Http("timeout".into())),
            )
            .unwrap_err();
        assert!(matches!(err, GateError::LiveQuote(_)));
        assert!(!gate.passes(&series, &bundle, Ok(f64::NAN)));
    }

    #[test]
    fn close_above_ma10_is_not_a_fresh_cross() {
        // Last closed bar of a steady rally already sits above ma10.
        let series = uptrend_series("UPUSDT");
        let bundle = IndicatorCalculator::default().compute(&series);
        assert!(!ConfirmationGate::default().passes(&series, &bundle, Ok(500.0)));
    }

    #[test]
    fn longer_lookback_requires_more_bars_below() {
        let series = pullback_series("UPUSDT");
        let bundle = IndicatorCalculator::default().compute(&series);
        let gate = gate_with(ConfirmationConfig {
            breakout_lookback: 2,
            ..ConfirmationConfig::default()
        });
        // close[-2] (172.2) was above its ma10.
        assert!(!gate.passes(&series, &bundle, Ok(150.0)));
    }

    #[test]
    fn quiet_volume_blocks_confirmation() {
        let series = flat_series(60, 100.0);
        let bundle = IndicatorCalculator::default().compute(&series);
        assert!(!ConfirmationGate::default().passes(&series, &bundle, Ok(101.0)));
    }

    #[test]
    fn surge_clause_accepts_quote_above_last_close() {
        let series = pullback_series("UPUSDT");
        let bundle = IndicatorCalculator::default().compute(&series);
        // 140 is below ma10 but above the 130 close; volume is 3000 vs ma10 1200.
        assert!(!ConfirmationGate::default().passes(&series, &bundle, Ok(140.0)));
        let surge = gate_with(ConfirmationConfig {
            surge_clause: true,
            ..ConfirmationConfig::default()
        });
        assert!(surge.passes(&series, &bundle, Ok(140.0)));
    }

    #[test]
    fn empty_bundle_is_data_unavailable() {
        let series = flat_series(10, 100.0);
        let bundle = IndicatorCalculator::default().compute(&series);
        assert_eq!(
            ConfirmationGate::default()
                .evaluate(&series, &bundle, Ok(100.0))
                .unwrap_err(),
            GateError::DataUnavailable { bars: 10, required: MIN_BARS }
        );
    }

    fn without(bundle: &IndicatorBundle, dropped: Indicator) -> IndicatorBundle {
        Indicator::ALL
            .into_iter()
            .filter(|&i| i != dropped)
            .filter_map(|i| bundle.get(i).map(|v| (i, v.to_vec())))
            .collect()
    }

    #[test]
    fn missing_indicator_fails_closed() {
        let series = pullback_series("UPUSDT");
        let full = IndicatorCalculator::default().compute(&series);
        let gate = ConfirmationGate::default();
        assert!(gate.passes(&series, &full, Ok(150.0)));

        for dropped in [Indicator::VolumeMa50, Indicator::Ma10] {
            let bundle = without(&full, dropped);
            assert_eq!(
                gate.evaluate(&series, &bundle, Ok(150.0)).unwrap_err(),
                GateError::IndicatorIncomplete(dropped)
            );
            assert!(!gate.passes(&series, &bundle, Ok(150.0)));
        }
    }
}
