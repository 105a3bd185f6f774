pub mod telegram;

pub use telegram::TelegramNotifier;

use async_trait::async_trait;

use crate::models::Verdict;

#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    /// Format and push one alert. Fire-and-forget: false on any transport
    /// failure or non-2xx response; a failed alert is simply lost.
    async fn dispatch(&self, instrument_name: &str, verdict: &Verdict, observed_price: f64)
        -> bool;
}
