use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use common::{Error, Interval, Result};

/// Largest kline `limit` the exchange accepts.
pub const MAX_CANDLE_LIMIT: usize = 1000;

/// Top-level gate and cadence config file (TOML). Every field has a default,
/// so a missing section keeps the stock behaviour.
///
/// Example `config/scout.toml`:
/// ```toml
/// [screening]
/// quorum = 4
/// rsi_threshold = 50.0
///
/// [confirmation]
/// breakout_lookback = 1
/// surge_clause = false
///
/// [scan]
/// sufficient_interval = "4h"
/// needed_schedules = ["0 12 21 * * *", "0 0 12 * * *"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoutFileConfig {
    pub screening: ScreeningConfig,
    pub confirmation: ConfirmationConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScreeningConfig {
    /// Conditions (out of five) that must hold.
    pub quorum: usize,
    /// RSI must be strictly above this.
    pub rsi_threshold: f64,
    /// ADX must be strictly above this.
    pub adx_threshold: f64,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            quorum: 4,
            rsi_threshold: 50.0,
            adx_threshold: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Latest volume must reach this multiple of the 50-bar mean.
    pub volume_multiplier: f64,
    /// Multiple of the 10-bar mean that counts as a sharp surge.
    pub surge_multiplier: f64,
    /// Closed bars (counting back from the latest) that must sit below ma10.
    pub breakout_lookback: usize,
    /// Accept a sharp surge with the quote above the last close.
    pub surge_clause: bool,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            volume_multiplier: 1.2,
            surge_multiplier: 2.0,
            breakout_lookback: 1,
            surge_clause: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Only symbols ending in this quote asset are scanned.
    pub quote_asset: String,
    pub needed_interval: Interval,
    pub sufficient_interval: Interval,
    pub candle_limit: usize,
    /// Six-field cron expressions (UTC) for the screening pass.
    pub needed_schedules: Vec<String>,
    pub sufficient_schedules: Vec<String>,
    pub alert_schedules: Vec<String>,
    /// Fractional rise over the bought price that triggers a holding alert.
    pub alert_rise_pct: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            quote_asset: "USDT".to_string(),
            needed_interval: Interval::OneDay,
            sufficient_interval: Interval::OneDay,
            candle_limit: 100,
            needed_schedules: vec!["0 12 21 * * *".to_string(), "0 0 12 * * *".to_string()],
            sufficient_schedules: vec!["0 0 * * * *".to_string()],
            alert_schedules: vec!["0 30 * * * *".to_string()],
            alert_rise_pct: 0.2,
        }
    }
}

impl ScoutFileConfig {
    /// Load from a TOML file, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No scout config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.screening.quorum) {
            return Err(Error::Config(format!(
                "screening.quorum must be within 1..=5, got {}",
                self.screening.quorum
            )));
        }
        if !(1..=3).contains(&self.confirmation.breakout_lookback) {
            return Err(Error::Config(format!(
                "confirmation.breakout_lookback must be within 1..=3, got {}",
                self.confirmation.breakout_lookback
            )));
        }
        let positive = [
            ("screening.rsi_threshold", self.screening.rsi_threshold),
            ("screening.adx_threshold", self.screening.adx_threshold),
            ("confirmation.volume_multiplier", self.confirmation.volume_multiplier),
            ("confirmation.surge_multiplier", self.confirmation.surge_multiplier),
            ("scan.alert_rise_pct", self.scan.alert_rise_pct),
        ];
        for (key, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!(
                    "{key} must be a positive number, got {value}"
                )));
            }
        }
        if self.screening.rsi_threshold >= 100.0 {
            return Err(Error::Config(format!(
                "screening.rsi_threshold must be below 100, got {}",
                self.screening.rsi_threshold
            )));
        }
        if self.scan.candle_limit > MAX_CANDLE_LIMIT {
            return Err(Error::Config(format!(
                "scan.candle_limit must be at most {MAX_CANDLE_LIMIT}, got {}",
                self.scan.candle_limit
            )));
        }
        if self.scan.candle_limit < crate::MIN_BARS {
            return Err(Error::Config(format!(
                "scan.candle_limit must be at least {}, got {}",
                crate::MIN_BARS,
                self.scan.candle_limit
            )));
        }
        if self.scan.quote_asset.is_empty() {
            return Err(Error::Config("scan.quote_asset must not be empty".into()));
        }
        Ok(())
    }
}
