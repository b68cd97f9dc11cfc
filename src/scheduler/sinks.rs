/// Collaborators the poller reports to
use log::{error, info, warn};
use time::OffsetDateTime;
use tokio::sync::watch;

use crate::config::Config;
use crate::models::{ConnectionStatus, GlucoseRange, Reading, ThresholdKind};
use crate::utils::panel_text;

/// Receives everything the panel would draw. Fire-and-forget.
pub trait DisplaySink: Send {
    fn on_reading_updated(&mut self, reading: &Reading);
    fn on_connection_status(&mut self, status: ConnectionStatus, retry_count: u32, max_retries: u32);
    fn on_error(&mut self, message: &str);
}

/// Told about every threshold crossing; decides itself whether to sound
pub trait AlertSink: Send {
    fn on_threshold_crossed(&mut self, glucose_value: i32, kind: ThresholdKind);
}

/// Desktop-level notification after a poll cycle exhausts its retries
pub trait NotificationSink: Send {
    fn on_connection_exhausted(&mut self, title: &str, message: &str);
}

pub struct Sinks {
    pub display: Box<dyn DisplaySink>,
    pub alerts: Box<dyn AlertSink>,
    pub notifier: Box<dyn NotificationSink>,
}

/// Display sink that writes the panel text to the log
pub struct LogDisplay {
    config: watch::Receiver<Config>,
}

impl LogDisplay {
    pub fn new(config: watch::Receiver<Config>) -> Self {
        LogDisplay { config }
    }
}

impl DisplaySink for LogDisplay {
    fn on_reading_updated(&mut self, reading: &Reading) {
        let thresholds = self.config.borrow().thresholds;
        let range = GlucoseRange::from(thresholds.classify(reading.glucose_value));
        info!(
            "{} [{:?} {}]",
            panel_text(reading, OffsetDateTime::now_utc()),
            range,
            range.color()
        );
    }

    fn on_connection_status(&mut self, status: ConnectionStatus, retry_count: u32, max_retries: u32) {
        match status {
            ConnectionStatus::Error if retry_count > 0 => {
                warn!("Connection error, retry {}/{}", retry_count, max_retries)
            }
            ConnectionStatus::Error => warn!("Connection error"),
            other => info!("Connection {}", other),
        }
    }

    fn on_error(&mut self, message: &str) {
        error!("{}", message);
    }
}

/// Notification sink that logs instead of talking to a desktop
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn on_connection_exhausted(&mut self, title: &str, message: &str) {
        warn!("{}: {}", title, message);
    }
}
