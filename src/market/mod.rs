pub mod binance;

pub use binance::BinanceClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BarSeries, Instrument};

#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fresh snapshot of the fixed watchlist. An empty result is treated
    /// as a failure by callers; never select an instrument from it.
    async fn list_instruments(&mut self) -> Result<Vec<Instrument>>;

    /// Up to `window` bars for one instrument, oldest first.
    async fn get_recent_bars(&mut self, instrument_id: &str, window: usize) -> Result<BarSeries>;
}
