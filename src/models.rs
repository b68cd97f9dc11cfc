use std::fmt;
use time::OffsetDateTime;

use crate::trend::Trend;

/// One glucose sample as reported by Nightscout.
///
/// `delta` and `trend` are empty until the reading has been annotated
/// against its predecessor (see [`crate::trend::annotate`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub glucose_value: i32,
    pub timestamp: Option<OffsetDateTime>,
    pub delta: Option<i32>,
    pub trend: Trend,
}

impl Reading {
    pub fn new(glucose_value: i32, timestamp: Option<OffsetDateTime>) -> Self {
        Reading {
            glucose_value,
            timestamp,
            delta: None,
            trend: Trend::Flat,
        }
    }

    pub fn with_change(self, delta: i32, trend: Trend) -> Self {
        Reading {
            delta: Some(delta),
            trend,
            ..self
        }
    }
}

/// A reading as retained by the history ring
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub glucose_value: i32,
    pub delta: Option<i32>,
    pub trend: Trend,
    pub timestamp: Option<OffsetDateTime>,
    pub inserted_at: OffsetDateTime,
}

impl HistoryEntry {
    pub fn from_reading(reading: &Reading, inserted_at: OffsetDateTime) -> Self {
        HistoryEntry {
            glucose_value: reading.glucose_value,
            delta: reading.delta,
            trend: reading.trend,
            timestamp: reading.timestamp,
            inserted_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryStats {
    pub avg: i32,
    pub min: i32,
    pub max: i32,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Connected,
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Unknown => "unknown",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Which configured bound a value has crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    UrgentHigh,
    High,
    Low,
    UrgentLow,
}

impl fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThresholdKind::UrgentHigh => "urgent high",
            ThresholdKind::High => "high",
            ThresholdKind::Low => "low",
            ThresholdKind::UrgentLow => "urgent low",
        };
        f.write_str(s)
    }
}

/// Display band of a glucose value, drives the panel color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlucoseRange {
    UrgentHigh,
    High,
    Normal,
    Low,
    UrgentLow,
}

impl GlucoseRange {
    pub fn color(self) -> &'static str {
        match self {
            GlucoseRange::UrgentHigh => "#ff0000",
            GlucoseRange::High => "#ffa500",
            GlucoseRange::Normal => "#00ff00",
            GlucoseRange::Low => "#ffa500",
            GlucoseRange::UrgentLow => "#ff0000",
        }
    }
}

impl From<Option<ThresholdKind>> for GlucoseRange {
    fn from(kind: Option<ThresholdKind>) -> Self {
        match kind {
            Some(ThresholdKind::UrgentHigh) => GlucoseRange::UrgentHigh,
            Some(ThresholdKind::High) => GlucoseRange::High,
            Some(ThresholdKind::Low) => GlucoseRange::Low,
            Some(ThresholdKind::UrgentLow) => GlucoseRange::UrgentLow,
            None => GlucoseRange::Normal,
        }
    }
}
