mod logging;

use std::sync::Arc;

use tracing::info;

use common::{Config, MarketData, Notifier, SignalStore, StoreKind};
use engine::{BinanceClient, PriceAlertChecker, Scheduler, UniverseScanner};
use store::{MemoryStore, SqliteStore};
use strategy::ScoutFileConfig;
use telegram_ctrl::{start_bot, BotDeps, TelegramNotifier};

#[tokio::main]
async fn main() {
    // ── Config + logging ─────────────────────────────────────────────────────
    let cfg = Config::from_env();
    logging::init(cfg.log_file.as_deref())
        .unwrap_or_else(|e| panic!("Failed to open log file: {e}"));
    let scout_file = ScoutFileConfig::load(&cfg.scout_config_path)
        .unwrap_or_else(|e| panic!("Invalid scout config: {e}"));
    info!(
        quote = %scout_file.scan.quote_asset,
        needed_interval = %scout_file.scan.needed_interval,
        sufficient_interval = %scout_file.scan.sufficient_interval,
        "Scout starting"
    );

    // ── Store ─────────────────────────────────────────────────────────────────
    let store: Arc<dyn SignalStore> = match cfg.store {
        StoreKind::Sqlite => Arc::new(
            SqliteStore::connect(&cfg.database_url)
                .await
                .unwrap_or_else(|e| panic!("Failed to open store: {e}")),
        ),
        StoreKind::Memory => {
            info!("Using in-memory store, needed set is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // ── Exchange client ───────────────────────────────────────────────────────
    let binance = match &cfg.binance_base_url {
        Some(url) => BinanceClient::with_base_url(cfg.binance_api_key.clone(), url.as_str()),
        None => BinanceClient::new(cfg.binance_api_key.clone()),
    }
    .unwrap_or_else(|e| panic!("Failed to build exchange client: {e}"));
    let market: Arc<dyn MarketData> = Arc::new(binance);

    // ── Telegram ──────────────────────────────────────────────────────────────
    let bot = teloxide::Bot::new(cfg.telegram_token.clone());
    let notifier: Arc<dyn Notifier> =
        Arc::new(TelegramNotifier::new(bot.clone(), &cfg.telegram_chat_ids));

    // ── Passes and scheduler ──────────────────────────────────────────────────
    let scanner = Arc::new(UniverseScanner::new(
        market.clone(),
        store.clone(),
        notifier.clone(),
        &scout_file,
    ));
    let alerts = Arc::new(PriceAlertChecker::new(
        market,
        store.clone(),
        notifier,
        scout_file.scan.alert_rise_pct,
    ));
    let (scheduler, handle) = Scheduler::new(scanner, alerts, &scout_file.scan)
        .unwrap_or_else(|e| panic!("Invalid schedule: {e}"));

    let bot_deps = BotDeps {
        scheduler: handle,
        store,
        allowed_user_ids: Arc::new(cfg.telegram_allowed_user_ids.clone()),
    };

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    tokio::spawn(scheduler.run());
    tokio::spawn(start_bot(bot, bot_deps));

    info!("All subsystems started. Waiting for shutdown signal.");
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received. Exiting.");
}
