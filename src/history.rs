/// Fixed-capacity history of recent readings
use std::collections::VecDeque;

use crate::models::{HistoryEntry, HistoryStats};

/// 24 hours at 5-minute spacing
pub const DEFAULT_CAPACITY: usize = 288;

#[derive(Debug, Clone)]
pub struct HistoryRing {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        HistoryRing {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest one when full
    pub fn append(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Up to `n` entries, most recent first
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        self.entries.iter().rev().take(n).cloned().collect()
    }

    /// Average, minimum and maximum over every retained entry.
    ///
    /// An empty ring yields all zeros. The average is rounded to the
    /// nearest integer.
    pub fn stats(&self) -> HistoryStats {
        if self.entries.is_empty() {
            return HistoryStats::default();
        }

        let count = self.entries.len();
        let values = || self.entries.iter().map(|e| e.glucose_value);
        let sum: i64 = values().map(i64::from).sum();

        HistoryStats {
            avg: (sum as f64 / count as f64).round() as i32,
            min: values().min().unwrap_or_default(),
            max: values().max().unwrap_or_default(),
            count,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        HistoryRing::new(DEFAULT_CAPACITY)
    }
}
