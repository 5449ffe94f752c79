use std::sync::Arc;

use teloxide::{
    dispatching::UpdateHandler,
    prelude::*,
    utils::command::BotCommands,
};
use tracing::{info, warn};

use common::{Gate, Holding, NeededSet, PassReport, ScanCommand, ScanStatus, SignalStore};
use engine::SchedulerHandle;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into every handler via `dptree`.
#[derive(Clone)]
pub struct BotDeps {
    pub scheduler: SchedulerHandle,
    pub store: Arc<dyn SignalStore>,
    pub allowed_user_ids: Arc<Vec<i64>>,
}

/// Telegram bot commands exposed to the operator.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Scout commands:")]
pub enum Command {
    #[command(description = "Show the last result of each pass")]
    Status,
    #[command(description = "List the stored needed set")]
    Needed,
    #[command(description = "Run the needed pass now")]
    Scan,
    #[command(description = "Run the sufficient pass now")]
    Confirm,
    #[command(description = "Check holdings against their bought price now")]
    Alerts,
    #[command(description = "Record a holding: /track SYMBOL PRICE", parse_with = "split")]
    Track { symbol: String, price: f64 },
    #[command(description = "Forget a holding: /untrack SYMBOL")]
    Untrack(String),
    #[command(description = "List recorded holdings")]
    Holdings,
}

/// Start the Telegram bot in long-polling mode.
pub async fn start_bot(bot: Bot, deps: BotDeps) {
    let deps = Arc::new(deps);

    info!("Telegram bot starting (long-polling)");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Status].endpoint(handle_status))
        .branch(case![Command::Needed].endpoint(handle_needed))
        .branch(case![Command::Scan].endpoint(handle_scan))
        .branch(case![Command::Confirm].endpoint(handle_confirm))
        .branch(case![Command::Alerts].endpoint(handle_alerts))
        .branch(case![Command::Track { symbol, price }].endpoint(handle_track))
        .branch(case![Command::Untrack(symbol)].endpoint(handle_untrack))
        .branch(case![Command::Holdings].endpoint(handle_holdings));

    Update::filter_message()
        .filter_map(|msg: Message| msg.from().map(|u| u.id))
        .filter_async(auth_filter)
        .branch(command_handler)
}

/// Silently drop messages from users not in the allowed list.
async fn auth_filter(user_id: UserId, deps: Arc<BotDeps>) -> bool {
    let uid = user_id.0 as i64;
    let allowed = deps.allowed_user_ids.contains(&uid);
    if !allowed {
        warn!(user_id = uid, "Unauthorized Telegram access attempt");
    }
    allowed
}

async fn handle_status(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let status = deps.scheduler.status().await;
    bot.send_message(msg.chat.id, status_text(&status)).await?;
    Ok(())
}

async fn handle_needed(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let needed = deps.store.load_needed().await?;
    bot.send_message(msg.chat.id, needed_text(&needed)).await?;
    Ok(())
}

async fn handle_scan(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let reply = request_pass(&deps, Gate::Needed).await;
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn handle_confirm(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let reply = request_pass(&deps, Gate::Sufficient).await;
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Queue an on-demand pass unless the same gate is already running.
async fn request_pass(deps: &BotDeps, gate: Gate) -> String {
    let running = deps.scheduler.status().await.is_running(gate);
    if !running {
        let cmd = match gate {
            Gate::Needed => ScanCommand::RunNeeded,
            Gate::Sufficient => ScanCommand::RunSufficient,
        };
        deps.scheduler.send(cmd).await;
    }
    pass_request_reply(gate, running)
}

fn pass_request_reply(gate: Gate, already_running: bool) -> String {
    let name = match gate {
        Gate::Needed => "Needed",
        Gate::Sufficient => "Sufficient",
    };
    if already_running {
        format!("{name} pass is already running; its result will be sent when it finishes.")
    } else {
        format!("{name} pass requested.")
    }
}

async fn handle_alerts(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    deps.scheduler.send(ScanCommand::CheckAlerts).await;
    bot.send_message(msg.chat.id, "Holding check requested.").await?;
    Ok(())
}

async fn handle_track(
    bot: Bot,
    msg: Message,
    deps: Arc<BotDeps>,
    (symbol, price): (String, f64),
) -> HandlerResult {
    if !price.is_finite() || price <= 0.0 {
        bot.send_message(msg.chat.id, "Price must be a positive number.").await?;
        return Ok(());
    }
    let symbol = symbol.to_uppercase();
    deps.store.record_holding(&symbol, price).await?;
    info!(symbol = %symbol, price, "Holding recorded");
    bot.send_message(msg.chat.id, format!("Tracking {symbol} bought at {price}."))
        .await?;
    Ok(())
}

async fn handle_untrack(
    bot: Bot,
    msg: Message,
    deps: Arc<BotDeps>,
    symbol: String,
) -> HandlerResult {
    let symbol = symbol.trim().to_uppercase();
    let text = if symbol.is_empty() {
        "Usage: /untrack SYMBOL".to_string()
    } else if deps.store.remove_holding(&symbol).await? {
        format!("Stopped tracking {symbol}.")
    } else {
        format!("{symbol} was not tracked.")
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_holdings(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    let holdings = deps.store.holdings().await?;
    bot.send_message(msg.chat.id, holdings_text(&holdings)).await?;
    Ok(())
}

fn status_text(status: &ScanStatus) -> String {
    fn line(name: &str, running: bool, report: Option<&PassReport>) -> String {
        let state = if running { " (running)" } else { "" };
        match report {
            Some(r) => format!(
                "{name}{state}: {} passed, {} evaluated, {} skipped at {}",
                r.passed.len(),
                r.evaluated,
                r.skipped,
                r.finished_at.format("%Y-%m-%d %H:%M UTC")
            ),
            None => format!("{name}{state}: no completed run yet"),
        }
    }

    format!(
        "Scout Status\n{}\n{}",
        line("Needed", status.needed_running, status.last_needed.as_ref()),
        line(
            "Sufficient",
            status.sufficient_running,
            status.last_sufficient.as_ref()
        ),
    )
}

fn needed_text(needed: &NeededSet) -> String {
    if needed.is_empty() {
        "The needed set is empty.".to_string()
    } else {
        format!("Needed set ({}): {needed}", needed.len())
    }
}

fn holdings_text(holdings: &[Holding]) -> String {
    if holdings.is_empty() {
        return "No holdings recorded.".to_string();
    }
    let lines: Vec<String> = holdings
        .iter()
        .map(|h| {
            format!(
                "{} bought at {} ({})",
                h.symbol,
                h.bought_price,
                h.recorded_at.format("%Y-%m-%d")
            )
        })
        .collect();
    format!("Holdings ({}):\n{}", holdings.len(), lines.join("\n"))
}
