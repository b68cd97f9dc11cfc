mod alerts;
mod config;
mod history;
mod models;
mod nightscout;
mod scheduler;
mod trend;
mod utils;

use log::{error, info, warn};
use std::env;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

use alerts::CooldownAlerts;
use config::Config;
use nightscout::NightscoutClient;
use scheduler::{LogDisplay, LogNotifier, Scheduler, SchedulerHandle, Sinks};
use utils::format_datetime;

const SUMMARY_ENTRIES: usize = 3;

/// Log connection state and history statistics before shutting down
async fn log_summary(handle: &SchedulerHandle) {
    let snapshot = handle.snapshot();
    info!(
        "Summary: connection {}, {} readings retained",
        snapshot.status, snapshot.stats.count
    );
    if snapshot.stats.count == 0 {
        warn!("No readings collected during this session!");
        return;
    }

    info!("  Average glucose: {} mg/dL", snapshot.stats.avg);
    info!("  Minimum glucose: {} mg/dL", snapshot.stats.min);
    info!("  Maximum glucose: {} mg/dL", snapshot.stats.max);
    for entry in handle.recent(SUMMARY_ENTRIES).await {
        info!(
            "  {} mg/dL {} at {}",
            entry.glucose_value,
            entry.trend.arrow(),
            format_datetime(&entry.inserted_at)
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let level = if env::var_os("NIGHTWATCHER_DEBUG").is_some() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    if !config.has_credentials() {
        warn!("NIGHTSCOUT_URL or NIGHTSCOUT_TOKEN is not set, waiting for SIGHUP after editing .env");
    }

    let client = NightscoutClient::new()?;
    let (config_tx, config_rx) = watch::channel(config);
    let sinks = Sinks {
        display: Box::new(LogDisplay::new(config_rx.clone())),
        // Terminal bell stands in for the alert sound
        alerts: Box::new(CooldownAlerts::new(config_rx.clone(), |_, _| eprint!("\x07"))),
        notifier: Box::new(LogNotifier),
    };

    let (scheduler, handle) = Scheduler::new(client, config_rx, sinks);
    let mut poller = tokio::spawn(scheduler.run());

    let mut hangup = signal(SignalKind::hangup())?;
    let mut refresh = signal(SignalKind::user_defined1())?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Program terminated by user. Exiting gracefully.");
                break;
            }
            _ = hangup.recv() => match Config::reload() {
                Ok(config) => {
                    info!("Configuration reloaded");
                    config_tx.send_replace(config);
                }
                Err(e) => error!("Keeping previous configuration: {}", e),
            },
            _ = refresh.recv() => handle.refresh(),
            result = &mut poller => {
                if let Err(e) = result {
                    error!("Poller task failed: {}", e);
                }
                return Ok(());
            }
        }
    }

    log_summary(&handle).await;
    handle.destroy();
    if let Err(e) = poller.await {
        error!("Poller task failed: {}", e);
    }
    if handle.is_destroyed() {
        info!("Program completed successfully");
    }

    Ok(())
}
