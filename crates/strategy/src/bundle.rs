use std::collections::BTreeMap;

use common::CandleSeries;

use crate::gates::GateError;
use crate::indicators::{sma, AdxIndicator, IchimokuIndicator, MacdIndicator, RsiIndicator};

/// Fewest candles for which the indicator bundle is computed at all.
pub const MIN_BARS: usize = 50;

/// Named series inside an [`IndicatorBundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Indicator {
    Ma10,
    Ma20,
    Ma50,
    Tenkan,
    Kijun,
    SenkouA,
    SenkouB,
    MacdLine,
    MacdSignal,
    MacdHistogram,
    Rsi,
    PlusDi,
    MinusDi,
    Adx,
    VolumeMa10,
    VolumeMa50,
}

impl Indicator {
    pub const ALL: [Indicator; 16] = [
        Indicator::Ma10,
        Indicator::Ma20,
        Indicator::Ma50,
        Indicator::Tenkan,
        Indicator::Kijun,
        Indicator::SenkouA,
        Indicator::SenkouB,
        Indicator::MacdLine,
        Indicator::MacdSignal,
        Indicator::MacdHistogram,
        Indicator::Rsi,
        Indicator::PlusDi,
        Indicator::MinusDi,
        Indicator::Adx,
        Indicator::VolumeMa10,
        Indicator::VolumeMa50,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Indicator::Ma10 => "ma10",
            Indicator::Ma20 => "ma20",
            Indicator::Ma50 => "ma50",
            Indicator::Tenkan => "tenkan",
            Indicator::Kijun => "kijun",
            Indicator::SenkouA => "senkou_a",
            Indicator::SenkouB => "senkou_b",
            Indicator::MacdLine => "macd",
            Indicator::MacdSignal => "macd_signal",
            Indicator::MacdHistogram => "macd_histogram",
            Indicator::Rsi => "rsi",
            Indicator::PlusDi => "di_plus",
            Indicator::MinusDi => "di_minus",
            Indicator::Adx => "adx",
            Indicator::VolumeMa10 => "volume_ma10",
            Indicator::VolumeMa50 => "volume_ma50",
        }
    }
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Indicator series aligned with the candle series they were computed from.
///
/// Leading positions whose window has not filled hold `NaN`. An empty bundle
/// means the input was too short to compute anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorBundle {
    series: BTreeMap<Indicator, Vec<f64>>,
}

impl IndicatorBundle {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn get(&self, indicator: Indicator) -> Option<&[f64]> {
        self.series.get(&indicator).map(Vec::as_slice)
    }

    /// Value `back` bars before the latest (`0` = latest).
    ///
    /// A missing series is an error; a missing position reads as `NaN` so
    /// comparisons against it are simply false.
    pub fn at(&self, indicator: Indicator, back: usize) -> Result<f64, GateError> {
        let values = self
            .get(indicator)
            .ok_or(GateError::IndicatorIncomplete(indicator))?;
        Ok(values
            .len()
            .checked_sub(back + 1)
            .and_then(|i| values.get(i).copied())
            .unwrap_or(f64::NAN))
    }

    pub fn latest(&self, indicator: Indicator) -> Result<f64, GateError> {
        self.at(indicator, 0)
    }
}

impl FromIterator<(Indicator, Vec<f64>)> for IndicatorBundle {
    fn from_iter<I: IntoIterator<Item = (Indicator, Vec<f64>)>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().collect(),
        }
    }
}

/// Turns a candle series into the fixed indicator battery used by both gates.
#[derive(Debug, Clone)]
pub struct IndicatorCalculator {
    ichimoku: IchimokuIndicator,
    macd: MacdIndicator,
    rsi: RsiIndicator,
    adx: AdxIndicator,
}

impl Default for IndicatorCalculator {
    fn default() -> Self {
        Self {
            ichimoku: IchimokuIndicator::new(9, 26, 52),
            macd: MacdIndicator::new(12, 26, 9),
            rsi: RsiIndicator::new(14),
            adx: AdxIndicator::new(14),
        }
    }
}

impl IndicatorCalculator {
    /// Compute every indicator over the whole series. Returns an empty bundle
    /// when fewer than [`MIN_BARS`] candles are available.
    pub fn compute(&self, series: &CandleSeries) -> IndicatorBundle {
        if series.len() < MIN_BARS {
            return IndicatorBundle::default();
        }

        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();
        let volumes = series.volumes();

        let ichimoku = self.ichimoku.compute(&highs, &lows);
        let macd = self.macd.compute(&closes);
        let dmi = self.adx.compute(&highs, &lows, &closes);

        [
            (Indicator::Ma10, sma::sma(&closes, 10)),
            (Indicator::Ma20, sma::sma(&closes, 20)),
            (Indicator::Ma50, sma::sma(&closes, 50)),
            (Indicator::Tenkan, ichimoku.tenkan),
            (Indicator::Kijun, ichimoku.kijun),
            (Indicator::SenkouA, ichimoku.senkou_a),
            (Indicator::SenkouB, ichimoku.senkou_b),
            (Indicator::MacdLine, macd.macd),
            (Indicator::MacdSignal, macd.signal),
            (Indicator::MacdHistogram, macd.histogram),
            (Indicator::Rsi, self.rsi.compute(&closes)),
            (Indicator::PlusDi, dmi.plus_di),
            (Indicator::MinusDi, dmi.minus_di),
            (Indicator::Adx, dmi.adx),
            (Indicator::VolumeMa10, sma::sma(&volumes, 10)),
            (Indicator::VolumeMa50, sma::sma(&volumes, 50)),
        ]
        .into_iter()
        .collect()
    }
}
