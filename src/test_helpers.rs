use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::models::{BarSeries, PriceBar, Recommendation, Sentiment, Verdict};

/// Bars from close prices with auto-incrementing hourly timestamps,
/// oldest first.
pub fn make_bars(closes: &[f64]) -> BarSeries {
    let base = DateTime::parse_from_rfc3339("2026-08-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);

    let bars: Vec<PriceBar> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            time: base + Duration::hours(i as i64),
            open: close - 5.0,
            high: close + 10.0,
            low: close - 10.0,
            close,
            volume: Some(100.0),
        })
        .collect();

    BarSeries::new(bars)
}

/// Config with every upstream pointed at `base` and no real credentials.
pub fn test_config(base: &str) -> Config {
    Config {
        market_data_base_url: base.to_string(),
        watchlist: vec![
            "BTCUSDT".to_string(),
            "ETHUSDT".to_string(),
            "SOLUSDT".to_string(),
            "BNBUSDT".to_string(),
            "ADAUSDT".to_string(),
        ],
        bar_window_size: 100,
        classifier_base_url: base.to_string(),
        classifier_api_key: "test-key".to_string(),
        classifier_model: "gemini-3-flash-preview".to_string(),
        store_url: base.to_string(),
        store_api_key: "test-key".to_string(),
        bot_token: "123:abc".to_string(),
        chat_id: "42".to_string(),
        poll_interval_secs: 3600,
        http_timeout_secs: 5,
        log_level: "info".to_string(),
    }
}

pub fn buy_verdict() -> Verdict {
    Verdict {
        sentiment: Sentiment::Bullish,
        recommendation: Recommendation::Buy,
        detected_pattern: "Ascending triangle".to_string(),
        rationale: "Higher lows pressing into flat resistance.".to_string(),
        support_level: 64000.0,
        resistance_level: 67000.0,
        entry_point: 64500.0,
        take_profit: 68000.0,
        stop_loss: 63000.0,
    }
}
