use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// One OHLCV bar. Series are ordered oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Kline interval accepted by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(Interval::OneHour),
            "4h" => Ok(Interval::FourHours),
            "1d" => Ok(Interval::OneDay),
            other => Err(Error::Config(format!("unsupported interval '{other}'"))),
        }
    }
}

/// Candles for a single (symbol, interval), most recent bar last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    pub symbol: String,
    pub interval: Interval,
    pub candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(symbol: impl Into<String>, interval: Interval, candles: Vec<Candle>) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            candles,
        }
    }

    /// An empty series, used when the provider had nothing to return.
    pub fn empty(symbol: impl Into<String>, interval: Interval) -> Self {
        Self::new(symbol, interval, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    /// Candle `back` bars before the latest one (`0` = latest).
    pub fn from_end(&self, back: usize) -> Option<&Candle> {
        let idx = self.candles.len().checked_sub(back + 1)?;
        self.candles.get(idx)
    }
}

/// Symbols that passed the most recent screening pass.
///
/// Replaced wholesale by every screening pass and read back by the next
/// confirmation pass. Iteration order is alphabetical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeededSet(BTreeSet<String>);

impl NeededSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>) -> bool {
        self.0.insert(symbol.into())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for NeededSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for NeededSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl std::fmt::Display for NeededSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self.0.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
        f.write_str(&joined)
    }
}

/// Outcome of one gate evaluation for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalVerdict {
    pub symbol: String,
    pub passed: bool,
    /// Number of individual conditions that held.
    pub satisfied_count: usize,
    pub checked_at: DateTime<Utc>,
}

/// Which stage of the screening pipeline a pass belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gate {
    /// Multi-factor screening; its survivors form the needed set.
    Needed,
    /// Volume and breakout confirmation over the needed set.
    Sufficient,
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gate::Needed => write!(f, "needed"),
            Gate::Sufficient => write!(f, "sufficient"),
        }
    }
}

/// Summary of one completed pass over a set of symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub gate: Gate,
    /// Symbols that reached a gate evaluation.
    pub evaluated: usize,
    /// Symbols dropped for missing data or failed lookups.
    pub skipped: usize,
    pub passed: Vec<String>,
    pub finished_at: DateTime<Utc>,
}

impl PassReport {
    /// Operator-facing message for this pass. Always mentions the evaluation
    /// time when nothing passed so an empty run is distinguishable from a
    /// missing one.
    pub fn message(&self) -> String {
        let at = self.finished_at.format("%Y-%m-%d %H:%M UTC");
        match (self.gate, self.passed.is_empty()) {
            (Gate::Needed, false) => format!(
                "Tokens meeting the needed conditions ({}): {}",
                self.passed.len(),
                self.passed.join(", ")
            ),
            (Gate::Needed, true) => {
                format!("No token met the needed conditions (checked {at}).")
            }
            (Gate::Sufficient, false) => format!(
                "Tokens meeting the sufficient conditions ({}): {}",
                self.passed.len(),
                self.passed.join(", ")
            ),
            (Gate::Sufficient, true) => {
                format!("No token met the sufficient conditions (checked {at}).")
            }
        }
    }
}

/// Bought-price record kept for simple rise alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub bought_price: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Commands accepted by the scheduler, e.g. from the Telegram bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCommand {
    RunNeeded,
    RunSufficient,
    CheckAlerts,
}

/// Last known outcome of each gate, shared with the Telegram bot.
#[derive(Debug, Clone, Default)]
pub struct ScanStatus {
    pub last_needed: Option<PassReport>,
    pub last_sufficient: Option<PassReport>,
    pub needed_running: bool,
    pub sufficient_running: bool,
}

impl ScanStatus {
    pub fn record(&mut self, report: PassReport) {
        match report.gate {
            Gate::Needed => self.last_needed = Some(report),
            Gate::Sufficient => self.last_sufficient = Some(report),
        }
    }

    pub fn is_running(&self, gate: Gate) -> bool {
        match gate {
            Gate::Needed => self.needed_running,
            Gate::Sufficient => self.sufficient_running,
        }
    }

    pub fn set_running(&mut self, gate: Gate, running: bool) {
        match gate {
            Gate::Needed => self.needed_running = running,
            Gate::Sufficient => self.sufficient_running = running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(close: f64) -> Candle {
        Candle {
            open_time: Utc.timestamp_opt(0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn from_end_indexes_backwards() {
        let series = CandleSeries::new(
            "BTCUSDT",
            Interval::OneDay,
            vec![candle(1.0), candle(2.0), candle(3.0)],
        );
        assert_eq!(series.from_end(0).unwrap().close, 3.0);
        assert_eq!(series.from_end(2).unwrap().close, 1.0);
        assert!(series.from_end(3).is_none());
    }

    #[test]
    fn needed_set_is_order_insensitive() {
        let a: NeededSet = ["ETHUSDT", "BTCUSDT"].into_iter().collect();
        let b: NeededSet = ["BTCUSDT", "ETHUSDT", "BTCUSDT"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "BTCUSDT, ETHUSDT");
    }

    #[test]
    fn interval_parses_exchange_strings() {
        assert_eq!("4h".parse::<Interval>().unwrap(), Interval::FourHours);
        assert!("2w".parse::<Interval>().is_err());
    }

    #[test]
    fn empty_report_mentions_time() {
        let report = PassReport {
            gate: Gate::Sufficient,
            evaluated: 3,
            skipped: 0,
            passed: vec![],
            finished_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
        };
        assert_eq!(
            report.message(),
            "No token met the sufficient conditions (checked 2024-05-01 08:30 UTC)."
        );
    }

    #[test]
    fn running_flags_are_per_gate() {
        let mut status = ScanStatus::default();
        status.set_running(Gate::Sufficient, true);
        assert!(status.is_running(Gate::Sufficient));
        assert!(!status.is_running(Gate::Needed));
    }
}
