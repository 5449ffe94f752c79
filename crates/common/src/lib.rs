pub mod config;
pub mod error;
pub mod exchange;
pub mod notify;
pub mod store;
pub mod types;

pub use config::{Config, StoreKind};
pub use error::{Error, Result};
pub use exchange::MarketData;
pub use notify::Notifier;
pub use store::SignalStore;
pub use types::*;
