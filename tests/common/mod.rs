use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dca_sentinel::alert::AlertDispatcher;
use dca_sentinel::classifier::Classifier;
use dca_sentinel::config::Config;
use dca_sentinel::error::{Error, Result};
use dca_sentinel::market::MarketData;
use dca_sentinel::models::{
    BarSeries, Instrument, PriceBar, Recommendation, RunState, Sentiment, SignalRecord, Verdict,
};
use dca_sentinel::monitor::Clock;
use dca_sentinel::store::SignalStore;

pub fn test_cfg() -> Config {
    Config {
        market_data_base_url: "http://market.invalid".to_string(),
        watchlist: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
        bar_window_size: 100,
        classifier_base_url: "http://classifier.invalid".to_string(),
        classifier_api_key: "test-key".to_string(),
        classifier_model: "gemini-3-flash-preview".to_string(),
        store_url: "http://store.invalid".to_string(),
        store_api_key: "test-key".to_string(),
        bot_token: "123:abc".to_string(),
        chat_id: "42".to_string(),
        poll_interval_secs: 3600,
        http_timeout_secs: 5,
        log_level: "info".to_string(),
    }
}

/// Bars from close prices, hourly, oldest first.
pub fn make_bars(closes: &[f64]) -> BarSeries {
    let base = DateTime::parse_from_rfc3339("2026-08-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);

    let bars: Vec<PriceBar> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            time: base + Duration::hours(i as i64),
            open: close - 5.0,
            high: close + 10.0,
            low: close - 10.0,
            close,
            volume: Some(100.0),
        })
        .collect();

    BarSeries::new(bars)
}

pub fn buy_verdict() -> Verdict {
    Verdict {
        sentiment: Sentiment::Bullish,
        recommendation: Recommendation::Buy,
        detected_pattern: "Ascending triangle".to_string(),
        rationale: "Higher lows pressing into flat resistance.".to_string(),
        support_level: 64000.0,
        resistance_level: 67000.0,
        entry_point: 64500.0,
        take_profit: 68000.0,
        stop_loss: 63000.0,
    }
}

pub fn wait_verdict() -> Verdict {
    Verdict {
        sentiment: Sentiment::Neutral,
        recommendation: Recommendation::Wait,
        detected_pattern: "Range".to_string(),
        rationale: "No edge at current levels.".to_string(),
        support_level: 64000.0,
        resistance_level: 67000.0,
        entry_point: 64500.0,
        take_profit: 68000.0,
        stop_loss: 63000.0,
    }
}

/// Market mock returning canned bars, or failing wholesale.
pub struct MockMarket {
    pub bars: BarSeries,
    pub fail: Arc<AtomicBool>,
}

impl MockMarket {
    pub fn new(bars: BarSeries) -> Self {
        Self {
            bars,
            fail: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl MarketData for MockMarket {
    async fn list_instruments(&mut self) -> Result<Vec<Instrument>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::UpstreamUnavailable("mock outage".to_string()));
        }
        Ok(vec![Instrument {
            id: "BTCUSDT".to_string(),
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            last_price: 65420.50,
            change_24h: 2.5,
        }])
    }

    async fn get_recent_bars(&mut self, _instrument_id: &str, window: usize) -> Result<BarSeries> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::UpstreamUnavailable("mock timeout".to_string()));
        }
        Ok(self.bars.tail(window))
    }
}

/// Classifier mock returning a fixed verdict, or a malformed-response
/// failure when `malformed` is set.
pub struct MockClassifier {
    pub verdict: Verdict,
    pub malformed: Arc<AtomicBool>,
    pub calls: Arc<AtomicUsize>,
}

impl MockClassifier {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            verdict,
            malformed: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, _instrument_name: &str, bars: &BarSeries) -> Result<Verdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!bars.is_empty(), "classifier must never see an empty window");
        if self.malformed.load(Ordering::SeqCst) {
            return Err(Error::MalformedResponse(
                "missing field `stopLoss`".to_string(),
            ));
        }
        Ok(self.verdict.clone())
    }
}

/// In-memory store shared between the loop under test and the test body,
/// standing in for the external datastore both processes talk to.
#[derive(Default)]
pub struct StoreState {
    pub records: Mutex<Vec<SignalRecord>>,
    pub run_state: Mutex<RunState>,
    pub fail_append: AtomicBool,
    pub fail_reads: AtomicBool,
}

#[derive(Clone)]
pub struct SharedStore(pub Arc<StoreState>);

impl SharedStore {
    pub fn new() -> Self {
        Self(Arc::new(StoreState::default()))
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.0.run_state.lock().unwrap().enabled = enabled;
    }

    pub fn record_count(&self) -> usize {
        self.0.records.lock().unwrap().len()
    }
}

#[async_trait]
impl SignalStore for SharedStore {
    async fn append(&self, record: &SignalRecord) -> bool {
        if self.0.fail_append.load(Ordering::SeqCst) {
            return false;
        }
        let mut stamped = record.clone();
        stamped.created_at = Some(Utc::now());
        self.0.records.lock().unwrap().push(stamped);
        true
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<SignalRecord>> {
        if self.0.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::UpstreamUnavailable("mock store outage".to_string()));
        }
        let records = self.0.records.lock().unwrap();
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    async fn read_run_state(&self) -> Result<RunState> {
        if self.0.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::UpstreamUnavailable("mock store outage".to_string()));
        }
        Ok(self.0.run_state.lock().unwrap().clone())
    }

    async fn write_run_state(&self, enabled: bool, active_instrument: Option<&str>) -> bool {
        let mut rs = self.0.run_state.lock().unwrap();
        // whole-record replace, as the real store does
        *rs = RunState {
            enabled,
            active_instrument: active_instrument.map(str::to_string),
            updated_at: Some(Utc::now()),
        };
        true
    }
}

/// Records every dispatch instead of posting anywhere.
#[derive(Default)]
pub struct DispatchLog {
    pub sent: Mutex<Vec<(String, Verdict, f64)>>,
    pub fail: AtomicBool,
}

#[derive(Clone)]
pub struct RecordingDispatcher(pub Arc<DispatchLog>);

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self(Arc::new(DispatchLog::default()))
    }

    pub fn sent_count(&self) -> usize {
        self.0.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl AlertDispatcher for RecordingDispatcher {
    async fn dispatch(
        &self,
        instrument_name: &str,
        verdict: &Verdict,
        observed_price: f64,
    ) -> bool {
        if self.0.fail.load(Ordering::SeqCst) {
            return false;
        }
        self.0
            .sent
            .lock()
            .unwrap()
            .push((instrument_name.to_string(), verdict.clone(), observed_price));
        true
    }
}

/// Clock that only ticks when the test says so.
#[derive(Clone)]
pub struct ManualClock(Arc<tokio::sync::Notify>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Arc::new(tokio::sync::Notify::new()))
    }

    /// Let exactly one pending (or the next) countdown elapse.
    pub fn advance(&self) {
        self.0.notify_one();
    }
}

#[async_trait]
impl Clock for ManualClock {
    async fn sleep(&self, _duration: std::time::Duration) {
        self.0.notified().await;
    }
}
