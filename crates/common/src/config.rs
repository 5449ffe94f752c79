/// Backing store for the needed set and holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Exchange
    pub binance_api_key: Option<String>,
    pub binance_base_url: Option<String>,

    // Telegram
    pub telegram_token: String,
    /// Chats that receive pass notifications.
    pub telegram_chat_ids: Vec<i64>,
    /// Users allowed to issue bot commands.
    pub telegram_allowed_user_ids: Vec<i64>,

    // Persistence
    pub store: StoreKind,
    pub database_url: String,

    // Gate thresholds and cadences (TOML)
    pub scout_config_path: String,

    /// Also append logs to this file when set.
    pub log_file: Option<String>,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let store = match optional_env("STORE")
            .unwrap_or_else(|| "sqlite".to_string())
            .to_lowercase()
            .as_str()
        {
            "sqlite" => StoreKind::Sqlite,
            "memory" => StoreKind::Memory,
            other => panic!("ERROR: STORE must be 'sqlite' or 'memory', got: '{other}'"),
        };

        let telegram_chat_ids = parse_id_list(&required_env("TELEGRAM_CHAT_IDS"))
            .unwrap_or_else(|bad| panic!("TELEGRAM_CHAT_IDS contains non-numeric ID: '{bad}'"));

        let telegram_allowed_user_ids = match optional_env("TELEGRAM_ALLOWED_USER_IDS") {
            Some(raw) => parse_id_list(&raw).unwrap_or_else(|bad| {
                panic!("TELEGRAM_ALLOWED_USER_IDS contains non-numeric ID: '{bad}'")
            }),
            None => telegram_chat_ids.clone(),
        };

        Config {
            binance_api_key: optional_env("BINANCE_API_KEY"),
            binance_base_url: optional_env("BINANCE_BASE_URL"),
            telegram_token: required_env("TELEGRAM_TOKEN"),
            telegram_chat_ids,
            telegram_allowed_user_ids,
            store,
            database_url: optional_env("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://scout.db?mode=rwc".to_string()),
            scout_config_path: optional_env("SCOUT_CONFIG_PATH")
                .unwrap_or_else(|| "config/scout.toml".to_string()),
            log_file: optional_env("LOG_FILE"),
        }
    }
}

/// Parse a comma-separated list of Telegram ids. Returns the offending entry
/// on failure. Empty entries are ignored.
pub fn parse_id_list(raw: &str) -> Result<Vec<i64>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().map_err(|_| s.to_string()))
        .collect()
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
