//! Zonewatch - geofence intersection engine for tourist safety monitoring
//!
//! Wires the session monitor to its tick sources, the backend publisher, and
//! the metrics reporter. The default session simulates a walk around the
//! configured origin; pass --replay to feed recorded fixes instead.

use clap::Parser;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration};
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use zonewatch::infra::{Config, Metrics};
use zonewatch::io::{
    create_egress_channel, BackendClient, BackendPublisher, EventJournal, LocationSource,
    ReplaySource, StaticSource,
};
use zonewatch::services::{Monitor, MonitorEvent};

/// Zonewatch - tourist safety geofence monitor
#[derive(Parser, Debug)]
#[command(name = "zonewatch", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to the CONFIG_FILE env
    /// var, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// JSONL file of recorded fixes to replay instead of simulating ticks
    #[arg(long)]
    replay: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), git = env!("GIT_HASH"), "zonewatch starting");

    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(|| {
        Config::resolve_config_path(&std::env::args().collect::<Vec<String>>())
    });
    let config = Config::load_from_path(&config_path);

    info!(
        config_file = %config.config_file(),
        site = %config.site_id(),
        backend = %config.backend_base_url(),
        backend_enabled = %config.backend_enabled(),
        origin = %config.origin(),
        walk_tick_ms = %config.walk_tick_ms(),
        nav_tick_ms = %config.nav_tick_ms(),
        seed = %config.seed(),
        "config_loaded"
    );

    // Shutdown signal shared by every task
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics = Arc::new(Metrics::new());
    let backend = Arc::new(BackendClient::new(&config, metrics.clone()));

    // Resolve the session origin from the location source
    let source: Box<dyn LocationSource> = match &args.replay {
        Some(path) => Box::new(ReplaySource::new(path, config.walk_tick_ms())),
        None => Box::new(StaticSource::new(config.origin())),
    };
    let origin = source.initial_fix().await.unwrap_or_else(|| config.origin());

    // One startup fetch so a reachable backend shows up in the logs early
    let alerts = backend.fetch_alerts().await;
    info!(
        pending_alerts = %alerts.as_array().map(|a| a.len()).unwrap_or(0),
        "backend_probed"
    );

    // Egress channel: monitor decisions in, HTTP calls and journal writes out
    let (egress, egress_rx) = create_egress_channel(1000, config.site_id().to_string());
    let journal = EventJournal::new(config.journal_file());
    let publisher = BackendPublisher::new(backend.clone(), journal, egress_rx);
    let publisher_shutdown = shutdown_rx.clone();
    let publisher_handle = tokio::spawn(async move {
        publisher.run(publisher_shutdown).await;
    });

    // Periodic replay of spooled alerts
    let spool_backend = backend.clone();
    let spool_interval_secs = config.backend_replay_interval_secs();
    let mut spool_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(spool_interval_secs.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => spool_backend.replay_spool().await,
                _ = spool_shutdown.changed() => {
                    if *spool_shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    });

    // Monitor event channel (bounded for backpressure)
    let (event_tx, event_rx) = mpsc::channel(1024);

    // Periodic metrics reporting
    let report_metrics = metrics.clone();
    let report_egress = egress.clone();
    let report_interval_secs = config.metrics_interval_secs();
    let mut report_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(report_interval_secs.max(1)));
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = report_metrics.report();
                    summary.log();
                    report_egress.send_metrics(summary);
                }
                _ = report_shutdown.changed() => {
                    if *report_shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    });

    if let Some(path) = args.replay {
        // Replay drives the monitor with recorded fixes; no walk ticks
        let replay = ReplaySource::new(&path, config.walk_tick_ms());
        let replay_tx = event_tx.clone();
        let replay_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            replay.run(replay_tx, replay_shutdown).await;
        });
    } else {
        // Walk ticker: one simulated fix per interval
        let walk_tx = event_tx.clone();
        let walk_tick_ms = config.walk_tick_ms();
        let mut walk_shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_millis(walk_tick_ms.max(1)));
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let _ = walk_tx.send(MonitorEvent::WalkTick).await;
                    }
                    _ = walk_shutdown.changed() => {
                        if *walk_shutdown.borrow() {
                            return;
                        }
                    }
                }
            }
        });
    }

    // Navigation ticker runs regardless of fix source; the monitor ignores it
    // outside the navigating state
    let nav_tx = event_tx.clone();
    let nav_tick_ms = config.nav_tick_ms();
    let mut nav_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(nav_tick_ms.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = nav_tx.send(MonitorEvent::NavTick).await;
                }
                _ = nav_shutdown.changed() => {
                    if *nav_shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    });

    // Ctrl-C stops the session cleanly before the tasks wind down
    let ctrlc_tx = event_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown_signal_received");
            let _ = ctrlc_tx.send(MonitorEvent::Stop).await;
        }
    });

    let mut monitor =
        Monitor::new(config, metrics, egress).with_origin(origin);

    event_tx.send(MonitorEvent::Start).await?;
    monitor.run(event_rx).await;

    // Stop background tasks and wait for the publisher to drain its queue;
    // each queued alert may take a full backend timeout to deliver
    let _ = shutdown_tx.send(true);
    if tokio::time::timeout(Duration::from_secs(10), publisher_handle).await.is_err() {
        warn!("publisher_drain_timeout");
    }

    info!("zonewatch stopped");
    Ok(())
}
