/// Threshold evaluation and cooldown-gated alerting
use log::{debug, warn};
use tokio::sync::watch;
use tokio::time::{Duration, Instant};

use crate::config::Config;
use crate::models::ThresholdKind;
use crate::scheduler::AlertSink;

/// Glucose bounds in mg/dL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub urgent_high: i32,
    pub high: i32,
    pub low: i32,
    pub urgent_low: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            urgent_high: 250,
            high: 180,
            low: 70,
            urgent_low: 55,
        }
    }
}

impl Thresholds {
    /// The most severe bound `value` has crossed, if any.
    ///
    /// Bounds are inclusive: a value equal to `high` counts as high.
    pub fn classify(&self, value: i32) -> Option<ThresholdKind> {
        if value >= self.urgent_high {
            Some(ThresholdKind::UrgentHigh)
        } else if value >= self.high {
            Some(ThresholdKind::High)
        } else if value <= self.urgent_low {
            Some(ThresholdKind::UrgentLow)
        } else if value <= self.low {
            Some(ThresholdKind::Low)
        } else {
            None
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.urgent_low < self.low && self.low < self.high && self.high < self.urgent_high
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    pub enabled: bool,
    pub urgent_high: bool,
    pub urgent_low: bool,
    pub cooldown: Duration,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        AlertPolicy {
            enabled: false,
            urgent_high: true,
            urgent_low: true,
            cooldown: Duration::from_secs(300),
        }
    }
}

impl AlertPolicy {
    fn sounds_for(&self, kind: ThresholdKind) -> bool {
        match kind {
            ThresholdKind::UrgentHigh => self.urgent_high,
            ThresholdKind::UrgentLow => self.urgent_low,
            ThresholdKind::High | ThresholdKind::Low => false,
        }
    }
}

/// Alert sink that fires at most once per cooldown window.
///
/// Only urgent crossings sound, each gated by its own toggle. The policy is
/// read from the live configuration on every call.
pub struct CooldownAlerts<P> {
    config: watch::Receiver<Config>,
    last_alert: Option<Instant>,
    play: P,
}

impl<P> CooldownAlerts<P>
where
    P: FnMut(i32, ThresholdKind) + Send,
{
    pub fn new(config: watch::Receiver<Config>, play: P) -> Self {
        CooldownAlerts {
            config,
            last_alert: None,
            play,
        }
    }
}

impl<P> AlertSink for CooldownAlerts<P>
where
    P: FnMut(i32, ThresholdKind) + Send,
{
    fn on_threshold_crossed(&mut self, glucose_value: i32, kind: ThresholdKind) {
        let policy = self.config.borrow().alerts;
        if !policy.enabled || !policy.sounds_for(kind) {
            return;
        }

        let now = Instant::now();
        if let Some(last) = self.last_alert {
            if now.duration_since(last) < policy.cooldown {
                debug!("Alert for {} suppressed by cooldown", glucose_value);
                return;
            }
        }

        warn!("Glucose {} mg/dL is {}", glucose_value, kind);
        (self.play)(glucose_value, kind);
        self.last_alert = Some(now);
    }
}
