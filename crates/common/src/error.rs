use thiserror::Error;

/// Failures from the market-data, store and config layers.
///
/// Gate evaluation has its own `GateError`; these only ever abort a pass or a
/// single symbol lookup.
#[derive(Debug, Error)]
pub enum Error {
    /// Binance answered with a non-success status.
    #[error("Binance returned HTTP {status}: {body}")]
    ExchangeStatus { status: u16, body: String },

    /// Binance answered, but the payload was unusable.
    #[error("Exchange API error: {0}")]
    Exchange(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
