use serde::{Deserialize, Serialize};

/// Snapshot of a watchlist entry. Replaced wholesale on each refresh;
/// identity is the `id` string only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    /// Market symbol used in API calls, e.g. "BTCUSDT".
    pub id: String,
    /// Display ticker, e.g. "BTC".
    pub symbol: String,
    /// Display name, e.g. "Bitcoin".
    pub name: String,
    pub last_price: f64,
    /// 24h change in percent.
    pub change_24h: f64,
}
