use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Recommendation, RunState, Sentiment, SignalRecord, Verdict};
use crate::store::SignalStore;

/// Fixed key of the singleton configs row.
const RUN_STATE_ID: &str = "global";

/// Wire shape of one `signals` row.
#[derive(Debug, Serialize, Deserialize)]
struct SignalRow {
    coin_name: String,
    symbol: String,
    current_price: f64,
    sentiment: Sentiment,
    recommendation: Recommendation,
    detected_pattern: String,
    reasoning: String,
    support_level: f64,
    resistance_level: f64,
    entry_point: f64,
    take_profit: f64,
    stop_loss: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl SignalRow {
    fn from_record(r: &SignalRecord) -> Self {
        Self {
            coin_name: r.instrument_id.clone(),
            symbol: r.symbol.clone(),
            current_price: r.observed_price,
            sentiment: r.verdict.sentiment,
            recommendation: r.verdict.recommendation,
            detected_pattern: r.verdict.detected_pattern.clone(),
            reasoning: r.verdict.rationale.clone(),
            support_level: r.verdict.support_level,
            resistance_level: r.verdict.resistance_level,
            entry_point: r.verdict.entry_point,
            take_profit: r.verdict.take_profit,
            stop_loss: r.verdict.stop_loss,
            created_at: None,
        }
    }

    fn into_record(self) -> SignalRecord {
        SignalRecord {
            instrument_id: self.coin_name,
            symbol: self.symbol,
            observed_price: self.current_price,
            verdict: Verdict {
                sentiment: self.sentiment,
                recommendation: self.recommendation,
                detected_pattern: self.detected_pattern,
                rationale: self.reasoning,
                support_level: self.support_level,
                resistance_level: self.resistance_level,
                entry_point: self.entry_point,
                take_profit: self.take_profit,
                stop_loss: self.stop_loss,
            },
            created_at: self.created_at,
        }
    }
}

/// Wire shape of the singleton `configs` row.
#[derive(Debug, Serialize, Deserialize)]
struct ConfigRow {
    id: String,
    is_auto_active: bool,
    last_selected_coin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: cfg.store_url.trim_end_matches('/').to_string(),
            api_key: cfg.store_api_key.clone(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }
}

#[async_trait]
impl SignalStore for SupabaseStore {
    async fn append(&self, record: &SignalRecord) -> bool {
        let row = SignalRow::from_record(record);

        let result = self
            .post("/rest/v1/signals")
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(status = %resp.status(), "signal append rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "signal append failed");
                false
            }
        }
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<SignalRecord>> {
        let resp = self
            .get("/rest/v1/signals")
            .query(&[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("store: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!("store: {}", status)));
        }

        let rows: Vec<SignalRow> = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("store: {}", e)))?;

        Ok(rows.into_iter().map(SignalRow::into_record).collect())
    }

    async fn read_run_state(&self) -> Result<RunState> {
        let resp = self
            .get("/rest/v1/configs")
            .query(&[("id", format!("eq.{}", RUN_STATE_ID)), ("select", "*".to_string())])
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("store: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!("store: {}", status)));
        }

        let mut rows: Vec<ConfigRow> = resp
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("store: {}", e)))?;

        // First-run case: no row written yet
        let Some(row) = rows.pop() else {
            return Ok(RunState::default());
        };

        Ok(RunState {
            enabled: row.is_auto_active,
            active_instrument: row.last_selected_coin,
            updated_at: row.updated_at,
        })
    }

    async fn write_run_state(&self, enabled: bool, active_instrument: Option<&str>) -> bool {
        let row = ConfigRow {
            id: RUN_STATE_ID.to_string(),
            is_auto_active: enabled,
            last_selected_coin: active_instrument.map(str::to_string),
            updated_at: Some(Utc::now()),
        };

        // Upsert: replaces the whole row on id conflict (last write wins)
        let result = self
            .post("/rest/v1/configs")
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(status = %resp.status(), "run state write rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "run state write failed");
                false
            }
        }
    }
}
