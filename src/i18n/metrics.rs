//! Console metrics and observability module.
//!
//! This module tracks how often localized content had to be degraded while
//! decoding, and how often the slider collection had to be resynchronized
//! after a failed write.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Global console metrics singleton.
pub struct ConsoleMetrics {
    /// Values decoded through the flat legacy path (one string for every track)
    legacy_fallbacks: AtomicUsize,

    /// Values (or per-track parts of values) replaced by the zero value
    degraded_values: AtomicUsize,

    /// Persistence requests that reported failure
    persistence_failures: AtomicUsize,

    /// Full collection reloads after a failed write
    resyncs: AtomicUsize,
}

/// Global metrics instance (initialized lazily)
static METRICS: OnceLock<ConsoleMetrics> = OnceLock::new();

impl ConsoleMetrics {
    /// Create a detached set of counters (the console itself uses `global()`).
    pub fn new() -> Self {
        Self {
            legacy_fallbacks: AtomicUsize::new(0),
            degraded_values: AtomicUsize::new(0),
            persistence_failures: AtomicUsize::new(0),
            resyncs: AtomicUsize::new(0),
        }
    }

    /// Get the global metrics instance.
    pub fn global() -> &'static ConsoleMetrics {
        METRICS.get_or_init(ConsoleMetrics::new)
    }

    pub fn record_legacy_fallback(&self) {
        self.legacy_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_degraded_value(&self) {
        self.degraded_values.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistence_failure(&self) {
        self.persistence_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resync(&self) {
        self.resyncs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn legacy_fallbacks(&self) -> usize {
        self.legacy_fallbacks.load(Ordering::Relaxed)
    }

    pub fn degraded_values(&self) -> usize {
        self.degraded_values.load(Ordering::Relaxed)
    }

    pub fn persistence_failures(&self) -> usize {
        self.persistence_failures.load(Ordering::Relaxed)
    }

    pub fn resyncs(&self) -> usize {
        self.resyncs.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            legacy_fallbacks: self.legacy_fallbacks(),
            degraded_values: self.degraded_values(),
            persistence_failures: self.persistence_failures(),
            resyncs: self.resyncs(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.legacy_fallbacks.store(0, Ordering::Relaxed);
        self.degraded_values.store(0, Ordering::Relaxed);
        self.persistence_failures.store(0, Ordering::Relaxed);
        self.resyncs.store(0, Ordering::Relaxed);
    }
}

impl Default for ConsoleMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the console counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub legacy_fallbacks: usize,
    pub degraded_values: usize,
    pub persistence_failures: usize,
    pub resyncs: usize,
}
