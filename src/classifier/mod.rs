pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BarSeries, Verdict};

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify recent price action into a structured verdict.
    ///
    /// `bars` must be non-empty. Implementations bound how much of the
    /// window is sent upstream; only the newest bars materially affect
    /// the verdict. No retry is performed here; the caller decides
    /// whether to try again on a later cycle.
    async fn classify(&self, instrument_name: &str, bars: &BarSeries) -> Result<Verdict>;
}
