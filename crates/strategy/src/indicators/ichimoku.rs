use super::sma::{rolling_max, rolling_min, shift_forward};

/// Ichimoku Kinko Hyo lines.
///
/// The leading spans are projected `base` bars forward, so the value at the
/// latest bar is the cloud computed `base` bars ago.
#[derive(Debug, Clone)]
pub struct IchimokuIndicator {
    pub conversion: usize,
    pub base: usize,
    pub span_b: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IchimokuSeries {
    pub tenkan: Vec<f64>,
    pub kijun: Vec<f64>,
    pub senkou_a: Vec<f64>,
    pub senkou_b: Vec<f64>,
}

impl IchimokuIndicator {
    pub fn new(conversion: usize, base: usize, span_b: usize) -> Self {
        Self {
            conversion,
            base,
            span_b,
        }
    }

    pub fn compute(&self, highs: &[f64], lows: &[f64]) -> IchimokuSeries {
        let tenkan = midpoint(highs, lows, self.conversion);
        let kijun = midpoint(highs, lows, self.base);
        let span_a: Vec<f64> = tenkan.iter().zip(&kijun).map(|(t, k)| (t + k) / 2.0).collect();
        let span_b = midpoint(highs, lows, self.span_b);

        IchimokuSeries {
            senkou_a: shift_forward(&span_a, self.base),
            senkou_b: shift_forward(&span_b, self.base),
            tenkan,
            kijun,
        }
    }
}

fn midpoint(highs: &[f64], lows: &[f64], window: usize) -> Vec<f64> {
    rolling_max(highs, window)
        .iter()
        .zip(rolling_min(lows, window))
        .map(|(h, l)| (h + l) / 2.0)
        .collect()
}
