use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

use crate::alert::AlertDispatcher;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Sentiment, Verdict};

const TELEGRAM_API: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_base: TELEGRAM_API.to_string(),
            bot_token: cfg.bot_token.clone(),
            chat_id: cfg.chat_id.clone(),
        })
    }

    /// Point at a different API host (used by tests).
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    fn sentiment_badge(s: Sentiment) -> &'static str {
        match s {
            Sentiment::Bullish => "🟢 Bullish",
            Sentiment::Bearish => "🔴 Bearish",
            Sentiment::Neutral => "⚪ Neutral",
        }
    }

    fn format_message(instrument_name: &str, verdict: &Verdict, observed_price: f64) -> String {
        format!(
            "🚀 *Crypto DCA Alert: {name}*\n\
             💰 Price: ${price}\n\
             📊 Sentiment: {sentiment}\n\
             🧩 Pattern: {pattern}\n\
             🎯 Recommendation: *{rec}*\n\
             \n\
             📍 *Trade plan:*\n\
             🟢 Entry: *${entry}*\n\
             🎁 Take Profit: *${tp}*\n\
             🛡 Stop Loss: *${sl}*\n\
             \n\
             💡 *Rationale:*\n\
             {rationale}\n\
             \n\
             📉 Support: ${support}\n\
             📈 Resistance: ${resistance}\n\
             \n\
             _1h bar window scan - DCA Sentinel_",
            name = instrument_name,
            price = observed_price,
            sentiment = Self::sentiment_badge(verdict.sentiment),
            pattern = verdict.detected_pattern,
            rec = verdict.recommendation,
            entry = verdict.entry_point,
            tp = verdict.take_profit,
            sl = verdict.stop_loss,
            rationale = verdict.rationale,
            support = verdict.support_level,
            resistance = verdict.resistance_level,
        )
    }
}

#[async_trait]
impl AlertDispatcher for TelegramNotifier {
    async fn dispatch(
        &self,
        instrument_name: &str,
        verdict: &Verdict,
        observed_price: f64,
    ) -> bool {
        if self.bot_token.is_empty() || self.chat_id.is_empty() {
            warn!("telegram credentials not configured, dropping alert");
            return false;
        }

        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": Self::format_message(instrument_name, verdict, observed_price),
            "parse_mode": "Markdown",
        });

        match self.client.post(url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(status = %resp.status(), "telegram rejected alert");
                false
            }
            Err(e) => {
                warn!(error = %e, "telegram alert failed");
                false
            }
        }
    }
}
