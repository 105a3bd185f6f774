use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Verdict;

/// A persisted verdict. Append-only; never mutated or deleted here.
/// Retention is the external store's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    pub instrument_id: String,
    pub symbol: String,
    /// Close of the newest bar at verdict time.
    pub observed_price: f64,
    pub verdict: Verdict,
    /// Server-assigned; `None` until the row has been read back.
    pub created_at: Option<DateTime<Utc>>,
}

impl SignalRecord {
    pub fn new(instrument_id: &str, symbol: &str, observed_price: f64, verdict: Verdict) -> Self {
        Self {
            instrument_id: instrument_id.to_string(),
            symbol: symbol.to_string(),
            observed_price,
            verdict,
            created_at: None,
        }
    }
}
