/// Exponential moving average over a series that may start with `NaN`s.
///
/// Seeded with the first finite value, smoothing factor `2 / (period + 1)`.
/// Positions before `period` finite observations have been seen are `NaN`.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 {
        return out;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut current: Option<f64> = None;
    let mut seen = 0usize;

    for (i, &value) in values.iter().enumerate() {
        current = match current {
            None if value.is_nan() => continue,
            None => Some(value),
            Some(prev) => Some(value * k + prev * (1.0 - k)),
        };
        seen += 1;
        if seen >= period {
            out[i] = current.unwrap_or(f64::NAN);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_of_constant_is_constant() {
        let out = ema(&[5.0; 10], 4);
        assert!(out[2].is_nan());
        assert!(out[3..].iter().all(|v| (*v - 5.0).abs() < 1e-12));
    }

    #[test]
    fn ema_skips_leading_nan() {
        let out = ema(&[f64::NAN, f64::NAN, 1.0, 3.0], 2);
        assert!(out[2].is_nan());
        // seed 1.0, k = 2/3 -> 3 * 2/3 + 1 / 3
        assert!((out[3] - 7.0 / 3.0).abs() < 1e-12);
    }
}
