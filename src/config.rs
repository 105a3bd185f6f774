use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Market data
    pub market_data_base_url: String,
    pub watchlist: Vec<String>,
    pub bar_window_size: usize,

    // Classifier
    pub classifier_base_url: String,
    pub classifier_api_key: String,
    pub classifier_model: String,

    // Signal store
    pub store_url: String,
    pub store_api_key: String,

    // Telegram
    pub bot_token: String,
    pub chat_id: String,

    // Monitor
    pub poll_interval_secs: u64,
    pub http_timeout_secs: u64,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let watchlist = env("WATCHLIST", "BTCUSDT,ETHUSDT,SOLUSDT,BNBUSDT,ADAUSDT")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Config {
            market_data_base_url: env("MARKET_DATA_BASE_URL", "https://api.binance.com"),
            watchlist,
            bar_window_size: env("BAR_WINDOW_SIZE", "100").parse().unwrap_or(100),
            classifier_base_url: env(
                "CLASSIFIER_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
            classifier_api_key: env("CLASSIFIER_API_KEY", ""),
            classifier_model: env("CLASSIFIER_MODEL", "gemini-3-flash-preview"),
            store_url: env("STORE_URL", ""),
            store_api_key: env("STORE_API_KEY", ""),
            bot_token: env("TELEGRAM_BOT_TOKEN", ""),
            chat_id: env("TELEGRAM_CHAT_ID", ""),
            poll_interval_secs: env("POLL_INTERVAL_SECS", "3600").parse().unwrap_or(3600),
            http_timeout_secs: env("HTTP_TIMEOUT_SECS", "10").parse().unwrap_or(10),
            log_level: env("LOG_LEVEL", "info"),
        }
    }
}
