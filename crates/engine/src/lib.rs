pub mod alerts;
pub mod binance;
pub mod scanner;
pub mod scheduler;

#[cfg(test)]
mod testutil;

pub use alerts::PriceAlertChecker;
pub use binance::BinanceClient;
pub use scanner::UniverseScanner;
pub use scheduler::{Job, Scheduler, SchedulerHandle};
