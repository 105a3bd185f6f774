pub mod bar;
pub mod instrument;
pub mod record;
pub mod run_state;
pub mod verdict;

pub use bar::{BarSeries, PriceBar};
pub use instrument::Instrument;
pub use record::SignalRecord;
pub use run_state::RunState;
pub use verdict::{Recommendation, Sentiment, Verdict};
