//! Sweep metrics.

use crate::{SweepKind, SweepOutcome};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use strum::IntoEnumIterator;

#[derive(Debug, Default)]
struct SweepCounters {
    runs: AtomicU64,
    failures: AtomicU64,
    changed: AtomicU64,
    skipped: AtomicU64,
    last_success: Mutex<Option<Instant>>,
}

/// Counters for every sweep. Clones share state.
#[derive(Debug, Clone)]
pub struct SweepMetrics {
    inner: Arc<BTreeMap<SweepKind, SweepCounters>>,
}

impl Default for SweepMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepMetrics {
    /// Zeroed counters for each sweep.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(
                SweepKind::iter()
                    .map(|kind| (kind, SweepCounters::default()))
                    .collect(),
            ),
        }
    }

    fn counters(&self, kind: SweepKind) -> Option<&SweepCounters> {
        self.inner.get(&kind)
    }

    /// Records a completed pass.
    pub fn record_success(&self, kind: SweepKind, outcome: &SweepOutcome) {
        if let Some(c) = self.counters(kind) {
            c.runs.fetch_add(1, Ordering::Relaxed);
            c.changed.fetch_add(outcome.changed as u64, Ordering::Relaxed);
            c.skipped.fetch_add(outcome.failed as u64, Ordering::Relaxed);
            *c.last_success.lock() = Some(Instant::now());
        }
    }

    /// Records a pass that failed outright.
    pub fn record_failure(&self, kind: SweepKind) {
        if let Some(c) = self.counters(kind) {
            c.runs.fetch_add(1, Ordering::Relaxed);
            c.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Passes started for `kind`.
    pub fn runs(&self, kind: SweepKind) -> u64 {
        self.counters(kind)
            .map(|c| c.runs.load(Ordering::Relaxed))
            .unwrap_or_default()
    }

    /// Passes of `kind` that failed outright.
    pub fn failures(&self, kind: SweepKind) -> u64 {
        self.counters(kind)
            .map(|c| c.failures.load(Ordering::Relaxed))
            .unwrap_or_default()
    }

    /// Records changed by `kind` so far.
    pub fn changed(&self, kind: SweepKind) -> u64 {
        self.counters(kind)
            .map(|c| c.changed.load(Ordering::Relaxed))
            .unwrap_or_default()
    }

    /// Records `kind` skipped after per-record errors.
    pub fn skipped(&self, kind: SweepKind) -> u64 {
        self.counters(kind)
            .map(|c| c.skipped.load(Ordering::Relaxed))
            .unwrap_or_default()
    }

    /// Time since `kind` last completed.
    pub fn time_since_success(&self, kind: SweepKind) -> Option<std::time::Duration> {
        self.counters(kind)
            .and_then(|c| c.last_success.lock().map(|instant| instant.elapsed()))
    }

    /// Share of passes that did not fail outright (0.0 - 1.0).
    pub fn overall_success_rate(&self) -> f64 {
        let runs: u64 = SweepKind::iter().map(|k| self.runs(k)).sum();
        let failures: u64 = SweepKind::iter().map(|k| self.failures(k)).sum();
        if runs == 0 {
            return 1.0;
        }
        runs.saturating_sub(failures) as f64 / runs as f64
    }

    /// Serializable view of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            sweeps: SweepKind::iter()
                .map(|kind| {
                    (
                        kind.to_string(),
                        SweepMetricSnapshot {
                            runs: self.runs(kind),
                            failures: self.failures(kind),
                            changed: self.changed(kind),
                            skipped: self.skipped(kind),
                            seconds_since_success: self
                                .time_since_success(kind)
                                .map(|d| d.as_secs()),
                        },
                    )
                })
                .collect(),
            overall_success_rate: self.overall_success_rate(),
        }
    }
}

/// Serializable snapshot of all sweeps.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Per-sweep counters keyed by sweep name.
    pub sweeps: BTreeMap<String, SweepMetricSnapshot>,
    /// Share of passes that did not fail outright.
    pub overall_success_rate: f64,
}

/// Serializable snapshot of one sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepMetricSnapshot {
    /// Passes started
    pub runs: u64,
    /// Passes that failed outright
    pub failures: u64,
    /// Records changed
    pub changed: u64,
    /// Records skipped after errors
    pub skipped: u64,
    /// Seconds since the last completed pass
    pub seconds_since_success: Option<u64>,
}
