//! Per-signal sliding-window statistics.
//!
//! Each active signal owns one [`SignalAggregator`] holding two time-based
//! retention windows:
//!
//! - a **short window** (1 s by default) whose mean smooths the "current"
//!   value shown to the user, and
//! - a **long window** (24 h by default) from which the daily min/max/average
//!   report is derived, extremes carrying the timestamp of the reading that
//!   set them.
//!
//! Readings arrive in time order from the sampling tick, so retention is a
//! front-only prune. The long-window mean and extremes are recomputed by a
//! single full pass on every ingest; at the 1 Hz sampling cadence the window
//! holds at most 86 400 entries, which is fine on this class of hardware. An
//! incremental implementation (min/max deque, running sum) can replace the
//! rescan behind the same `ingest`/`snapshot` surface if the cadence ever
//! rises.

use std::collections::VecDeque;

use super::Reading;
use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Snapshot
// ───────────────────────────────────────────────────────────────

/// Immutable point-in-time view of one signal's statistics.
///
/// `long_min`/`long_max` are `0.0` with epoch `0` while the long window is
/// empty; an epoch of `0` renders as "never recorded" in reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSnapshot {
    pub current: f32,
    pub short_avg: f32,
    pub long_avg: f32,
    pub long_min: f32,
    pub long_min_epoch: u64,
    pub long_max: f32,
    pub long_max_epoch: u64,
}

// ───────────────────────────────────────────────────────────────
// Aggregator
// ───────────────────────────────────────────────────────────────

/// Incrementally maintained sliding-window statistics for one signal.
pub struct SignalAggregator {
    short_retention_ms: u64,
    long_retention_ms: u64,

    current: f32,
    short_window: VecDeque<Reading>,
    long_window: VecDeque<Reading>,

    short_avg: f32,
    long_avg: f32,
    long_min: Option<Reading>,
    long_max: Option<Reading>,
}

impl SignalAggregator {
    pub fn new(short_retention_ms: u64, long_retention_ms: u64) -> Self {
        Self {
            short_retention_ms,
            long_retention_ms,
            current: 0.0,
            short_window: VecDeque::new(),
            long_window: VecDeque::new(),
            short_avg: 0.0,
            long_avg: 0.0,
            long_min: None,
            long_max: None,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(
            u64::from(config.short_window_ms),
            u64::from(config.long_window_secs) * 1000,
        )
    }

    /// Fold one reading into both windows.
    ///
    /// A non-finite value is dropped without touching any state. Otherwise
    /// the reading becomes the current value, both windows are appended and
    /// pruned (ages measured against this reading's own stamp), and the
    /// derived statistics are recomputed from the surviving entries.
    pub fn ingest(&mut self, reading: Reading) {
        if !reading.value.is_finite() {
            return;
        }

        self.current = reading.value;
        self.short_window.push_back(reading);
        self.long_window.push_back(reading);

        let now_ms = reading.mono_ms;
        Self::prune(&mut self.short_window, now_ms, self.short_retention_ms);
        Self::prune(&mut self.long_window, now_ms, self.long_retention_ms);

        self.short_avg = Self::mean(&self.short_window);
        self.rescan_long();
    }

    /// Immutable view of the current statistics. Never blocks, never
    /// mutates; two calls with no intervening ingest return identical
    /// results.
    pub fn snapshot(&self) -> SignalSnapshot {
        SignalSnapshot {
            current: self.current,
            short_avg: self.short_avg,
            long_avg: self.long_avg,
            long_min: self.long_min.map_or(0.0, |r| r.value),
            long_min_epoch: self.long_min.map_or(0, |r| r.epoch_secs),
            long_max: self.long_max.map_or(0.0, |r| r.value),
            long_max_epoch: self.long_max.map_or(0, |r| r.epoch_secs),
        }
    }

    /// Entries currently retained in the short window.
    pub fn short_len(&self) -> usize {
        self.short_window.len()
    }

    /// Entries currently retained in the long window.
    pub fn long_len(&self) -> usize {
        self.long_window.len()
    }

    // ── Internal ──────────────────────────────────────────────

    // Insertion is time-ordered, so dropping from the front until the oldest
    // survivor is young enough is a complete prune.
    fn prune(window: &mut VecDeque<Reading>, now_ms: u64, retention_ms: u64) {
        while let Some(oldest) = window.front() {
            if now_ms.saturating_sub(oldest.mono_ms) > retention_ms {
                window.pop_front();
            } else {
                break;
            }
        }
    }

    fn mean(window: &VecDeque<Reading>) -> f32 {
        if window.is_empty() {
            return 0.0;
        }
        let sum: f64 = window.iter().map(|r| f64::from(r.value)).sum();
        (sum / window.len() as f64) as f32
    }

    // Single pass over the long window: mean, min, max. The first entry
    // seeds both extremes; only a strictly smaller/larger value replaces
    // one, so ties keep the earliest-seen extreme.
    fn rescan_long(&mut self) {
        let mut entries = self.long_window.iter();
        let Some(first) = entries.next() else {
            self.long_avg = 0.0;
            self.long_min = None;
            self.long_max = None;
            return;
        };

        let mut sum = f64::from(first.value);
        let mut min = *first;
        let mut max = *first;

        for r in entries {
            sum += f64::from(r.value);
            if r.value < min.value {
                min = *r;
            }
            if r.value > max.value {
                max = *r;
            }
        }

        self.long_avg = (sum / self.long_window.len() as f64) as f32;
        self.long_min = Some(min);
        self.long_max = Some(max);
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
