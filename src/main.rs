use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use dca_sentinel::alert::TelegramNotifier;
use dca_sentinel::classifier::GeminiClient;
use dca_sentinel::config::Config;
use dca_sentinel::market::{BinanceClient, MarketData};
use dca_sentinel::monitor::{MonitorCommand, MonitorLoop, TokioClock};
use dca_sentinel::store::SupabaseStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    info!(
        interval_secs = cfg.poll_interval_secs,
        window = cfg.bar_window_size,
        "DCA Sentinel starting up"
    );

    let mut market = BinanceClient::new(&cfg)?;

    // Startup watchlist snapshot. An empty list counts as a failure:
    // nothing is ever selected from it.
    match market.list_instruments().await {
        Ok(instruments) if !instruments.is_empty() => {
            for i in &instruments {
                info!(
                    "  {} ({}): ${} {:+.2}%",
                    i.symbol, i.name, i.last_price, i.change_24h
                );
            }
        }
        Ok(_) => warn!("watchlist snapshot came back empty"),
        Err(e) => warn!(error = %e, "watchlist snapshot unavailable"),
    }

    let classifier = GeminiClient::new(&cfg)?;
    let store = SupabaseStore::new(&cfg)?;
    let alerts = TelegramNotifier::new(&cfg)?;

    let mut monitor = MonitorLoop::new(
        &cfg,
        Box::new(market),
        Box::new(classifier),
        Box::new(store),
        Box::new(alerts),
        Arc::new(TokioClock),
    );

    let (commands, command_rx) = mpsc::channel(8);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down...");
            let _ = commands.send(MonitorCommand::Shutdown).await;
        }
    });

    monitor.run(command_rx).await;

    Ok(())
}
