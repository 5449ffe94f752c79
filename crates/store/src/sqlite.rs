use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use common::{Error, Holding, NeededSet, Result, SignalStore};

/// SQLite-backed store. Schema lives in `migrations/` at the workspace root.
#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    /// Connect and run pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let in_memory = database_url.contains(":memory:");
        let mut options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            // Every connection to `:memory:` is a separate database; keep the one.
            options = options.idle_timeout(None).max_lifetime(None);
        }
        let db = options.connect(database_url).await?;
        sqlx::migrate!("../../migrations").run(&db).await?;
        info!("Database ready");
        Ok(Self { db })
    }
}

#[async_trait]
impl SignalStore for SqliteStore {
    async fn load_needed(&self) -> Result<NeededSet> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT symbol FROM needed_tokens")
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|(symbol,)| symbol).collect())
    }

    async fn save_needed(&self, set: &NeededSet) -> Result<()> {
        let saved_at = Utc::now().to_rfc3339();
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM needed_tokens")
            .execute(&mut *tx)
            .await?;
        for symbol in set.iter() {
            sqlx::query("INSERT INTO needed_tokens (symbol, saved_at) VALUES (?1, ?2)")
                .bind(symbol)
                .bind(&saved_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        debug!(count = set.len(), "Needed set saved");
        Ok(())
    }

    async fn holdings(&self) -> Result<Vec<Holding>> {
        let rows: Vec<(String, f64, String)> = sqlx::query_as(
            "SELECT symbol, bought_price, recorded_at FROM holdings ORDER BY symbol",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|(symbol, bought_price, recorded_at)| {
                let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
                    .map_err(|e| Error::Corrupt(format!("bad recorded_at for {symbol}: {e}")))?
                    .with_timezone(&Utc);
                Ok(Holding {
                    symbol,
                    bought_price,
                    recorded_at,
                })
            })
            .collect()
    }

    async fn record_holding(&self, symbol: &str, bought_price: f64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO holdings (symbol, bought_price, recorded_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(symbol) DO UPDATE SET
                bought_price = excluded.bought_price,
                recorded_at = excluded.recorded_at
            "#,
        )
        .bind(symbol)
        .bind(bought_price)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn remove_holding(&self, symbol: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM holdings WHERE symbol = ?1")
            .bind(symbol)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
