/// ADX / DMI with Wilder smoothing.
///
/// 1. +DM, −DM and true range from consecutive bars
/// 2. Wilder-smooth each over `window` periods (seeded with the plain sum)
/// 3. ±DI = smoothed DM / smoothed TR × 100
/// 4. DX = |+DI − −DI| / (+DI + −DI) × 100
/// 5. ADX = mean of the first `window` DX values, then Wilder-smoothed
///
/// ±DI are defined from index `window`, ADX from `2 * window - 1`.
#[derive(Debug, Clone)]
pub struct AdxIndicator {
    pub window: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdxSeries {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

impl AdxIndicator {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "ADX window must be >= 1");
        Self { window }
    }

    pub fn compute(&self, highs: &[f64], lows: &[f64], closes: &[f64]) -> AdxSeries {
        let n = closes.len().min(highs.len()).min(lows.len());
        let w = self.window;
        let mut out = AdxSeries {
            adx: vec![f64::NAN; n],
            plus_di: vec![f64::NAN; n],
            minus_di: vec![f64::NAN; n],
        };
        if n < 2 * w {
            return out;
        }

        let mut tr = vec![0.0; n];
        let mut plus_dm = vec![0.0; n];
        let mut minus_dm = vec![0.0; n];
        for i in 1..n {
            tr[i] = (highs[i] - lows[i])
                .max((highs[i] - closes[i - 1]).abs())
                .max((lows[i] - closes[i - 1]).abs());
            let up = highs[i] - highs[i - 1];
            let down = lows[i - 1] - lows[i];
            if up > down && up > 0.0 {
                plus_dm[i] = up;
            }
            if down > up && down > 0.0 {
                minus_dm[i] = down;
            }
        }

        let mut s_tr: f64 = tr[1..=w].iter().sum();
        let mut s_plus: f64 = plus_dm[1..=w].iter().sum();
        let mut s_minus: f64 = minus_dm[1..=w].iter().sum();
        let mut dx = vec![f64::NAN; n];

        for i in w..n {
            if i > w {
                s_tr = s_tr - s_tr / w as f64 + tr[i];
                s_plus = s_plus - s_plus / w as f64 + plus_dm[i];
                s_minus = s_minus - s_minus / w as f64 + minus_dm[i];
            }
            let (p, m) = if s_tr > 0.0 {
                (100.0 * s_plus / s_tr, 100.0 * s_minus / s_tr)
            } else {
                (0.0, 0.0)
            };
            out.plus_di[i] = p;
            out.minus_di[i] = m;
            dx[i] = if p + m > 0.0 {
                100.0 * (p - m).abs() / (p + m)
            } else {
                0.0
            };
        }

        let mut adx = dx[w..2 * w].iter().sum::<f64>() / w as f64;
        out.adx[2 * w - 1] = adx;
        for i in 2 * w..n {
            adx = (adx * (w - 1) as f64 + dx[i]) / w as f64;
            out.adx[i] = adx;
        }
        out
    }
}
