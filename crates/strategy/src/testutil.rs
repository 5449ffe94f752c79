//! Candle series builders shared by unit tests here and in dependent crates
//! (enable the `test-util` feature).

use chrono::{Duration, TimeZone, Utc};

use common::{Candle, CandleSeries, Interval};

/// Daily candles with `high == low == close` and constant volume.
pub fn series_from_closes(symbol: &str, closes: &[f64]) -> CandleSeries {
    let bars = closes.iter().map(|&c| (c, c, c, 1_000.0)).collect::<Vec<_>>();
    series_from_bars(symbol, Interval::OneDay, &bars)
}

/// Build a series from `(close, high, low, volume)` tuples.
pub fn series_from_bars(
    symbol: &str,
    interval: Interval,
    bars: &[(f64, f64, f64, f64)],
) -> CandleSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let step = match interval {
        Interval::OneHour => Duration::hours(1),
        Interval::FourHours => Duration::hours(4),
        Interval::OneDay => Duration::days(1),
    };
    let candles = bars
        .iter()
        .enumerate()
        .map(|(i, &(close, high, low, volume))| Candle {
            open_time: start + step * i as i32,
            open: close,
            high,
            low,
            close,
            volume,
        })
        .collect();
    CandleSeries::new(symbol, interval, candles)
}

pub fn flat_series(len: usize, price: f64) -> CandleSeries {
    series_from_closes("FLATUSDT", &vec![price; len])
}

/// 30 flat bars at 100 followed by a 20-bar accelerating rally
/// (`100 + 0.2 * i²`), with 3x volume on the final bar.
pub fn uptrend_series(symbol: &str) -> CandleSeries {
    let mut closes: Vec<f64> = vec![100.0; 30];
    closes.extend((1..=20).map(|i| 100.0 + 0.2 * (i * i) as f64));
    series_from_bars(symbol, Interval::OneDay, &with_ranges(&closes))
}

/// Same rally on 4-hour bars, except the last closed bar drops to 130,
/// below its ten-bar average (~144.7). A live quote above ~144.7 is a fresh
/// cross back over ma10.
pub fn pullback_series(symbol: &str) -> CandleSeries {
    let mut closes: Vec<f64> = vec![100.0; 30];
    closes.extend((1..=19).map(|i| 100.0 + 0.2 * (i * i) as f64));
    closes.push(130.0);
    series_from_bars(symbol, Interval::FourHours, &with_ranges(&closes))
}

fn with_ranges(closes: &[f64]) -> Vec<(f64, f64, f64, f64)> {
    let last = closes.len() - 1;
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let spread = if i >= 30 { 0.5 } else { 0.0 };
            let volume = if i == last { 3_000.0 } else { 1_000.0 };
            (c, c + spread, c - spread, volume)
        })
        .collect()
}
