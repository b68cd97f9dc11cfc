/// Trend and delta calculation between two consecutive readings
use std::fmt;
use time::OffsetDateTime;

use crate::models::Reading;

// Rate of change thresholds in mg/dL per minute
const VERY_FAST_RISE: f64 = 3.0;
const FAST_RISE: f64 = 2.0;
const MODERATE_RISE: f64 = 1.0;
const MODERATE_FALL: f64 = -1.0;
const FAST_FALL: f64 = -2.0;
const VERY_FAST_FALL: f64 = -3.0;

/// Readings further apart than this are too sparse for a rate
const MAX_ELAPSED_MINUTES: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trend {
    DoubleUp,
    SingleUp,
    FortyFiveUp,
    #[default]
    Flat,
    FortyFiveDown,
    SingleDown,
    DoubleDown,
}

impl Trend {
    /// Arrow shown next to the glucose value in the panel
    pub fn arrow(self) -> &'static str {
        match self {
            Trend::DoubleUp => "↑↑",
            Trend::SingleUp => "↑",
            Trend::FortyFiveUp => "↗",
            Trend::Flat => "→",
            Trend::FortyFiveDown => "↘",
            Trend::SingleDown => "↓",
            Trend::DoubleDown => "↓↓",
        }
    }

    /// Nightscout direction name
    pub fn name(self) -> &'static str {
        match self {
            Trend::DoubleUp => "DoubleUp",
            Trend::SingleUp => "SingleUp",
            Trend::FortyFiveUp => "FortyFiveUp",
            Trend::Flat => "Flat",
            Trend::FortyFiveDown => "FortyFiveDown",
            Trend::SingleDown => "SingleDown",
            Trend::DoubleDown => "DoubleDown",
        }
    }

    /// Classify a rate of change in mg/dL per minute
    pub fn from_rate(rate: f64) -> Self {
        if rate >= VERY_FAST_RISE {
            Trend::DoubleUp
        } else if rate >= FAST_RISE {
            Trend::SingleUp
        } else if rate >= MODERATE_RISE {
            Trend::FortyFiveUp
        } else if rate <= VERY_FAST_FALL {
            Trend::DoubleDown
        } else if rate <= FAST_FALL {
            Trend::SingleDown
        } else if rate <= MODERATE_FALL {
            Trend::FortyFiveDown
        } else {
            Trend::Flat
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compute delta and trend for a (current, previous) pair.
///
/// The delta is always reported. The trend falls back to `Flat` when either
/// timestamp is missing, or when the readings are not between 0 (exclusive)
/// and 15 minutes (inclusive) apart.
pub fn calculate(current: &Reading, previous: &Reading) -> (i32, Trend) {
    let delta = current.glucose_value.saturating_sub(previous.glucose_value);
    let trend = match (current.timestamp, previous.timestamp) {
        (Some(now), Some(before)) => classify(delta, now, before),
        _ => Trend::Flat,
    };
    (delta, trend)
}

/// Return `current` with delta and trend filled in from `previous`
pub fn annotate(current: Reading, previous: &Reading) -> Reading {
    let (delta, trend) = calculate(&current, previous);
    current.with_change(delta, trend)
}

fn classify(delta: i32, now: OffsetDateTime, before: OffsetDateTime) -> Trend {
    let elapsed_minutes = (now - before).as_seconds_f64() / 60.0;
    if elapsed_minutes <= 0.0 || elapsed_minutes > MAX_ELAPSED_MINUTES {
        return Trend::Flat;
    }

    Trend::from_rate(delta as f64 / elapsed_minutes)
}
