pub mod adx;
pub mod ema;
pub mod ichimoku;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use adx::{AdxIndicator, AdxSeries};
pub use ichimoku::{IchimokuIndicator, IchimokuSeries};
pub use macd::{MacdIndicator, MacdSeries};
pub use rsi::RsiIndicator;
