//! One-shot scan for an external scheduler (cron). Reads the shared
//! RunState, exits quietly when monitoring is disabled or no instrument
//! is selected, otherwise runs exactly one cycle and exits. Runs as an
//! independent process against the same store as the interactive monitor.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use dca_sentinel::alert::TelegramNotifier;
use dca_sentinel::classifier::GeminiClient;
use dca_sentinel::config::Config;
use dca_sentinel::market::BinanceClient;
use dca_sentinel::monitor::{CycleOutcome, MonitorLoop, TokioClock};
use dca_sentinel::store::{SignalStore, SupabaseStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    let store = SupabaseStore::new(&cfg)?;

    let run_state = store.read_run_state().await?;
    if !run_state.enabled {
        info!("skipped: auto-monitor is disabled");
        return Ok(());
    }
    let Some(instrument) = run_state.active_instrument.clone() else {
        info!("skipped: no instrument selected");
        return Ok(());
    };

    let market = BinanceClient::new(&cfg)?;
    let classifier = GeminiClient::new(&cfg)?;
    let alerts = TelegramNotifier::new(&cfg)?;

    let mut monitor = MonitorLoop::new(
        &cfg,
        Box::new(market),
        Box::new(classifier),
        Box::new(store),
        Box::new(alerts),
        Arc::new(TokioClock),
    );
    monitor.set_active_instrument(&instrument);

    match monitor.run_cycle().await {
        CycleOutcome::Completed {
            verdict,
            stored,
            alerted,
        } => info!(
            instrument = %instrument,
            recommendation = %verdict.recommendation,
            stored,
            alerted,
            "scan complete"
        ),
        CycleOutcome::Aborted(e) => warn!(instrument = %instrument, error = %e, "scan aborted"),
        CycleOutcome::Skipped => info!("scan skipped"),
    }

    Ok(())
}
