use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::classifier::Classifier;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{BarSeries, Verdict};

/// Newest bars forwarded upstream; anything older is dropped before
/// prompt assembly.
const TAIL_WINDOW: usize = 100;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: cfg.classifier_base_url.trim_end_matches('/').to_string(),
            api_key: cfg.classifier_api_key.clone(),
            model: cfg.classifier_model.clone(),
        })
    }

    /// Every second close of the tail window, oldest first.
    fn price_summary(bars: &BarSeries) -> String {
        bars.tail(TAIL_WINDOW)
            .iter()
            .step_by(2)
            .map(|b| format!("[{}] C:{:.2}", b.time.format("%Y-%m-%d %H:%M"), b.close))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn build_prompt(instrument_name: &str, bars: &BarSeries) -> String {
        let current = bars.last().map(|b| b.close).unwrap_or_default();
        format!(
            "You are a seasoned cryptocurrency technical analyst. Analyze the \
             recent 1-hour candles of {name}.\n\
             \n\
             Price data (every 2 hours): {summary}\n\
             Current price: {current:.2}\n\
             \n\
             Tasks:\n\
             1. Identify the primary trend and name the candlestick or chart \
             pattern you detect.\n\
             2. Produce a concrete DCA strategy: optimal entry point, take \
             profit target, and stop loss for risk management, plus the \
             nearest support and resistance levels.\n\
             3. Recommend an action: BUY (DCA), HOLD, or WAIT.\n\
             \n\
             Respond in JSON.",
            name = instrument_name,
            summary = Self::price_summary(bars),
            current = current,
        )
    }

    fn response_schema() -> serde_json::Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "sentiment": { "type": "STRING", "enum": ["Bullish", "Bearish", "Neutral"] },
                "recommendation": { "type": "STRING", "enum": ["BUY (DCA)", "HOLD", "WAIT"] },
                "detectedPattern": { "type": "STRING" },
                "reasoning": { "type": "STRING" },
                "supportLevel": { "type": "NUMBER" },
                "resistanceLevel": { "type": "NUMBER" },
                "entryPoint": { "type": "NUMBER" },
                "takeProfit": { "type": "NUMBER" },
                "stopLoss": { "type": "NUMBER" }
            },
            "required": [
                "sentiment", "recommendation", "detectedPattern", "reasoning",
                "supportLevel", "resistanceLevel", "entryPoint", "takeProfit",
                "stopLoss"
            ]
        })
    }

    /// The upstream model is not guaranteed to honor the schema, so the
    /// verdict is re-validated here: any missing field or unknown enum
    /// value is a malformed response, not a degraded verdict.
    fn parse_verdict(text: &str) -> Result<Verdict> {
        serde_json::from_str(text.trim()).map_err(|e| Error::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl Classifier for GeminiClient {
    async fn classify(&self, instrument_name: &str, bars: &BarSeries) -> Result<Verdict> {
        if bars.is_empty() {
            return Err(Error::ClassificationUnavailable(
                "empty bar window".to_string(),
            ));
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": Self::build_prompt(instrument_name, bars) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": Self::response_schema(),
            }
        });

        let resp = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::ClassificationUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::ClassificationUnavailable(format!(
                "{}: {}",
                status, body
            )));
        }

        let data: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;

        let text = data
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| Error::MalformedResponse("no candidates in response".to_string()))?;

        Self::parse_verdict(text)
    }
}
