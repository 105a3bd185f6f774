use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shared singleton row controlling the monitor. Another process may
/// rewrite it between any two reads; writes are whole-record replacements
/// with last-write-wins semantics, so readers must treat it as eventually
/// consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    pub enabled: bool,
    /// Instrument id the monitor targets, e.g. "BTCUSDT".
    pub active_instrument: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for RunState {
    /// First-run state: monitoring disabled, nothing selected.
    fn default() -> Self {
        Self {
            enabled: false,
            active_instrument: None,
            updated_at: None,
        }
    }
}
