//! Incremental block-cadence statistics.
//!
//! Two kinds of state live here. Lifetime aggregates (`count`, `sum`,
//! `min`, `max`, fast/fail counters) grow without bound for the whole
//! session — that is intentional. The bounded structures are the
//! per-scope 200-sample FIFO used for percentile estimation and the
//! global 50-slot sliding window whose running sum is maintained
//! incrementally (add the new value, subtract the evicted one) instead
//! of being recomputed every tick.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::VecDeque;

/// Most recent durations kept per scope for percentile estimation.
pub const RECENT_SAMPLE_CAP: usize = 200;

/// Capacity of the global sliding window.
pub const WINDOW_CAP: usize = 50;

/// Classification thresholds, in seconds.
///
/// The two thresholds are not validated against each other: if a
/// configuration overlaps them, a single duration counts as both fast
/// and fail.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatsConfig {
    pub fast_threshold_secs: f64,
    pub fail_threshold_secs: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { fast_threshold_secs: 0.7, fail_threshold_secs: 5.0 }
    }
}

impl StatsConfig {
    pub fn is_fast(&self, duration_secs: f64) -> bool {
        duration_secs <= self.fast_threshold_secs
    }

    pub fn is_fail(&self, duration_secs: f64) -> bool {
        duration_secs >= self.fail_threshold_secs
    }
}

/// Lifetime aggregates plus a bounded sample FIFO for one scope.
#[derive(Debug, Clone)]
pub struct CadenceStats {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub fast_count: u64,
    pub fail_count: u64,
    recent: VecDeque<f64>,
}

impl Default for CadenceStats {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: 0.0,
            fast_count: 0,
            fail_count: 0,
            recent: VecDeque::with_capacity(RECENT_SAMPLE_CAP),
        }
    }
}

impl CadenceStats {
    fn record(&mut self, duration_secs: f64, config: &StatsConfig) {
        if self.recent.len() == RECENT_SAMPLE_CAP {
            self.recent.pop_front();
        }
        self.recent.push_back(duration_secs);

        self.count += 1;
        self.sum += duration_secs;
        self.min = self.min.min(duration_secs);
        self.max = self.max.max(duration_secs);
        if config.is_fast(duration_secs) {
            self.fast_count += 1;
        }
        if config.is_fail(duration_secs) {
            self.fail_count += 1;
        }
    }

    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Percentage of recorded blocks classified fast.
    pub fn fast_rate(&self) -> f64 {
        percentage(self.fast_count, self.count)
    }

    /// Percentage of recorded blocks classified fail.
    pub fn fail_rate(&self) -> f64 {
        percentage(self.fail_count, self.count)
    }

    /// Nearest-rank percentile over the retained samples.
    ///
    /// Sorts the current FIFO ascending and selects the sample at index
    /// `round(p/100 * (n-1))`, clamped into range — no interpolation.
    /// Because only the most recent 200 durations are retained, this is
    /// an approximation of the scope's true percentile, not an exact
    /// lifetime statistic.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.recent.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = self.recent.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let rank = ((p / 100.0) * (sorted.len() - 1) as f64).round() as isize;
        let rank = rank.clamp(0, sorted.len() as isize - 1) as usize;
        Some(sorted[rank])
    }

    #[cfg(test)]
    fn recent_len(&self) -> usize {
        self.recent.len()
    }
}

/// Bounded FIFO of recent durations with an incrementally maintained sum.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    window: VecDeque<f64>,
    running_sum: f64,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self { window: VecDeque::with_capacity(capacity), running_sum: 0.0, capacity }
    }

    pub fn push(&mut self, duration_secs: f64) {
        self.window.push_back(duration_secs);
        self.running_sum += duration_secs;
        if self.window.len() > self.capacity {
            if let Some(evicted) = self.window.pop_front() {
                self.running_sum -= evicted;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn running_sum(&self) -> f64 {
        self.running_sum
    }

    pub fn average(&self) -> Option<f64> {
        (!self.window.is_empty()).then(|| self.running_sum / self.window.len() as f64)
    }

    /// Blocks per second implied by the window average; 0 when the
    /// window is empty or the average is non-positive.
    pub fn rate(&self) -> f64 {
        match self.average() {
            Some(avg) if avg > 0.0 => 1.0 / avg,
            _ => 0.0,
        }
    }

    #[cfg(test)]
    fn exact_sum(&self) -> f64 {
        self.window.iter().sum()
    }
}

/// All cadence statistics for one monitoring session: the global scope,
/// the global sliding window, and one scope per attributed proposer.
#[derive(Debug)]
pub struct CadenceBook {
    config: StatsConfig,
    global: CadenceStats,
    window: SlidingWindow,
    per_proposer: HashMap<String, CadenceStats>,
}

impl CadenceBook {
    pub fn new(config: StatsConfig) -> Self {
        Self {
            config,
            global: CadenceStats::default(),
            window: SlidingWindow::new(WINDOW_CAP),
            per_proposer: HashMap::new(),
        }
    }

    /// Record one per-block duration under both the global scope and the
    /// proposer's scope. The sliding window is global only.
    pub fn record(&mut self, proposer_key: &str, duration_secs: f64) {
        self.global.record(duration_secs, &self.config);
        self.window.push(duration_secs);
        self.per_proposer
            .entry(proposer_key.to_string())
            .or_default()
            .record(duration_secs, &self.config);
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    pub fn global(&self) -> &CadenceStats {
        &self.global
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    pub fn proposer(&self, key: &str) -> Option<&CadenceStats> {
        self.per_proposer.get(key)
    }

    pub fn proposers(&self) -> impl Iterator<Item = (&String, &CadenceStats)> {
        self.per_proposer.iter()
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}
