pub mod clock;

pub use clock::{Clock, TokioClock};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::alert::AlertDispatcher;
use crate::classifier::Classifier;
use crate::config::Config;
use crate::error::Error;
use crate::market::MarketData;
use crate::models::{SignalRecord, Verdict};
use crate::store::SignalStore;

/// Read-back depth for the recent-signal display.
const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No countdown running.
    Idle,
    /// Countdown running toward the next cycle.
    Armed,
    /// A cycle's fetch→classify→store→maybe-alert sequence is in flight.
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorCommand {
    Enable,
    Disable,
    AnalyzeNow,
    Shutdown,
}

/// What one cycle did, for binaries and tests to observe. The
/// user-visible status indicator is rendered as tracing events.
#[derive(Debug)]
pub enum CycleOutcome {
    /// No instrument selected; nothing ran.
    Skipped,
    /// Fetch or classification failed; nothing stored, nothing alerted.
    /// The countdown still resets.
    Aborted(Error),
    Completed {
        verdict: Verdict,
        stored: bool,
        alerted: bool,
    },
}

/// Owns the countdown and drives one cycle per tick. The only stateful
/// component: everything else is a request/response client behind a trait.
///
/// RunState is never cached across a cycle. A second process may flip it
/// at any point, so the alert gate re-reads it from the store every time.
pub struct MonitorLoop {
    market: Box<dyn MarketData>,
    classifier: Box<dyn Classifier>,
    store: Box<dyn SignalStore>,
    alerts: Box<dyn AlertDispatcher>,
    clock: Arc<dyn Clock>,

    poll_interval: Duration,
    bar_window: usize,
    default_instrument: Option<String>,

    state: MonitorState,
    active_instrument: Option<String>,
    last_verdict: Option<Verdict>,
    recent: Vec<SignalRecord>,
}

impl MonitorLoop {
    pub fn new(
        cfg: &Config,
        market: Box<dyn MarketData>,
        classifier: Box<dyn Classifier>,
        store: Box<dyn SignalStore>,
        alerts: Box<dyn AlertDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            market,
            classifier,
            store,
            alerts,
            clock,
            poll_interval: Duration::from_secs(cfg.poll_interval_secs),
            bar_window: cfg.bar_window_size,
            default_instrument: cfg.watchlist.first().cloned(),
            state: MonitorState::Idle,
            active_instrument: None,
            last_verdict: None,
            recent: Vec::new(),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn active_instrument(&self) -> Option<&str> {
        self.active_instrument.as_deref()
    }

    pub fn set_active_instrument(&mut self, id: &str) {
        self.active_instrument = Some(id.to_string());
    }

    /// Verdict of the most recent successful cycle.
    pub fn last_verdict(&self) -> Option<&Verdict> {
        self.last_verdict.as_ref()
    }

    /// Last successful read-back of the signal log, newest first.
    pub fn recent_signals(&self) -> &[SignalRecord] {
        &self.recent
    }

    /// Drive the loop until `Shutdown` or the command channel closes.
    ///
    /// Startup discovers the shared RunState: a row left enabled by a
    /// previous session (or another process) arms the countdown
    /// immediately.
    pub async fn run(&mut self, mut commands: mpsc::Receiver<MonitorCommand>) {
        match self.store.read_run_state().await {
            Ok(rs) => {
                if rs.active_instrument.is_some() {
                    self.active_instrument = rs.active_instrument;
                }
                if rs.enabled {
                    self.state = MonitorState::Armed;
                    info!(
                        instrument = self.active_instrument.as_deref().unwrap_or("-"),
                        "monitoring enabled in run state, arming countdown"
                    );
                }
            }
            Err(e) => warn!(error = %e, "run state unavailable at startup, staying idle"),
        }

        loop {
            match self.state {
                MonitorState::Armed => {
                    let clock = Arc::clone(&self.clock);
                    let interval = self.poll_interval;
                    tokio::select! {
                        cmd = commands.recv() => {
                            let Some(cmd) = cmd else { break };
                            if self.handle_command(cmd).await {
                                break;
                            }
                        }
                        _ = clock.sleep(interval) => {
                            self.run_cycle().await;
                        }
                    }
                }
                _ => {
                    let Some(cmd) = commands.recv().await else { break };
                    if self.handle_command(cmd).await {
                        break;
                    }
                }
            }
        }

        info!("monitor loop stopped");
    }

    /// Returns true on shutdown.
    async fn handle_command(&mut self, cmd: MonitorCommand) -> bool {
        match cmd {
            MonitorCommand::Enable => {
                self.enable().await;
                false
            }
            MonitorCommand::Disable => {
                self.disable().await;
                false
            }
            MonitorCommand::AnalyzeNow => {
                self.run_cycle().await;
                false
            }
            MonitorCommand::Shutdown => true,
        }
    }

    /// Arm the countdown and replicate the toggle to the shared RunState.
    /// A failed write is logged and does not block the local transition;
    /// other processes read an eventually-consistent row.
    pub async fn enable(&mut self) {
        if self.active_instrument.is_none() {
            self.active_instrument = self.default_instrument.clone();
        }
        if !self
            .store
            .write_run_state(true, self.active_instrument.as_deref())
            .await
        {
            warn!("enable: run state write failed");
        }
        self.state = MonitorState::Armed;
        info!(
            instrument = self.active_instrument.as_deref().unwrap_or("-"),
            interval_secs = self.poll_interval.as_secs(),
            "monitoring enabled"
        );
    }

    /// Stop scheduling new cycles immediately. An in-flight cycle (when
    /// called from another process's toggle) still finishes; its alert
    /// gate re-reads the flag this writes.
    pub async fn disable(&mut self) {
        if !self
            .store
            .write_run_state(false, self.active_instrument.as_deref())
            .await
        {
            warn!("disable: run state write failed");
        }
        self.state = MonitorState::Idle;
        info!("monitoring disabled");
    }

    /// One full cycle. Also the manual "analyze now" path: identical
    /// pipeline, legal from `Idle`, and the countdown resets afterwards
    /// if the loop stays armed.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let Some(instrument) = self
            .active_instrument
            .clone()
            .or_else(|| self.default_instrument.clone())
        else {
            warn!("cycle skipped: no instrument selected");
            return CycleOutcome::Skipped;
        };

        let resume_state = match self.state {
            // A disabled loop running a manual cycle goes back to Idle
            MonitorState::Idle => MonitorState::Idle,
            _ => MonitorState::Armed,
        };
        self.state = MonitorState::Running;

        let outcome = self.cycle_steps(&instrument).await;
        match &outcome {
            CycleOutcome::Aborted(e) => warn!(instrument = %instrument, error = %e, "cycle aborted"),
            CycleOutcome::Completed { stored, alerted, .. } => {
                info!(instrument = %instrument, stored, alerted, "cycle completed")
            }
            CycleOutcome::Skipped => {}
        }

        // Success or failure, the countdown resets
        self.state = resume_state;
        outcome
    }

    async fn cycle_steps(&mut self, instrument: &str) -> CycleOutcome {
        // 1. Fetch. Any failure aborts the cycle before a verdict exists.
        debug!(instrument = %instrument, "fetching bar window");
        let bars = match self.market.get_recent_bars(instrument, self.bar_window).await {
            Ok(bars) if bars.is_empty() => {
                return CycleOutcome::Aborted(Error::UpstreamUnavailable(
                    "empty bar window".to_string(),
                ))
            }
            Ok(bars) => bars,
            Err(e) => return CycleOutcome::Aborted(e),
        };
        let observed_price = bars.last().map(|b| b.close).unwrap_or_default();

        // 2. Classify. A structurally invalid verdict is a failure, not a
        // degraded result; it must not reach the store or the dispatcher.
        debug!(instrument = %instrument, bars = bars.len(), "classifying");
        let verdict = match self.classifier.classify(instrument, &bars).await {
            Ok(v) => v,
            Err(e) => return CycleOutcome::Aborted(e),
        };

        // 3. Persist, best-effort. Display and alerting proceed on the
        // in-memory verdict whether or not the durable copy landed.
        let record = SignalRecord::new(instrument, instrument, observed_price, verdict.clone());
        let stored = self.store.append(&record).await;
        if !stored {
            warn!(instrument = %instrument, "verdict not persisted, continuing");
        }
        self.last_verdict = Some(verdict.clone());

        match self.store.list_recent(RECENT_LIMIT).await {
            Ok(recent) => self.recent = recent,
            Err(e) => debug!(error = %e, "recent-signal read-back unavailable"),
        }

        // 4. Alert on BUY only, and only if the shared RunState still says
        // enabled. It may have been flipped by the operator or another
        // process since this cycle started; a failed re-read suppresses
        // the alert.
        let mut alerted = false;
        if verdict.recommendation.is_buy() {
            let enabled_now = match self.store.read_run_state().await {
                Ok(rs) => rs.enabled,
                Err(e) => {
                    warn!(error = %e, "run state re-read failed, suppressing alert");
                    false
                }
            };

            if enabled_now {
                alerted = self
                    .alerts
                    .dispatch(instrument, &verdict, observed_price)
                    .await;
                if !alerted {
                    warn!(instrument = %instrument, "alert dispatch failed, dropping");
                }
            } else {
                info!(instrument = %instrument, "BUY verdict but monitoring disabled, alert suppressed");
            }
        }

        CycleOutcome::Completed {
            verdict,
            stored,
            alerted,
        }
    }
}
