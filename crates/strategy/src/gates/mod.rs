pub mod confirmation;
pub mod screening;

pub use confirmation::ConfirmationGate;
pub use screening::{Condition, ScreeningGate};

use thiserror::Error;

use crate::bundle::Indicator;

/// Why a gate could not reach a verdict. Callers treat every variant as a
/// failed gate for that symbol.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GateError {
    #[error("insufficient data: {bars} bars, need {required}")]
    DataUnavailable { bars: usize, required: usize },

    #[error("indicator '{0}' missing from bundle")]
    IndicatorIncomplete(Indicator),

    #[error("live quote unavailable: {0}")]
    LiveQuote(String),
}
