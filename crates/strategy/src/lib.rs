pub mod bundle;
pub mod config;
pub mod gates;
pub mod indicators;
#[cfg(any(test, feature = "test-util"))]
pub mod testutil;

pub use bundle::{Indicator, IndicatorBundle, IndicatorCalculator, MIN_BARS};
pub use config::{
    ConfirmationConfig, ScanConfig, ScoutFileConfig, ScreeningConfig, MAX_CANDLE_LIMIT,
};
pub use gates::{Condition, ConfirmationGate, GateError, ScreeningGate};
