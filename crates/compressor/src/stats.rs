use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;
use crate::console;
use crate::job::{display_name, reduction_percent, ConversionOutcome};

/// Shared counters updated from any worker.
///
/// Fields are independent; no update spans more than one of them. Values are only
/// meaningful once every worker has been joined, see [`Stats::snapshot`].
#[derive(Debug, Default)]
pub struct Stats {
    total: AtomicU64,
    converted: AtomicU64,
    failed: AtomicU64,
    bytes_before: AtomicU64,
    bytes_after: AtomicU64,
}

/// Plain copy of [`Stats`] taken after the pool has drained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub converted: u64,
    pub failed: u64,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl StatsSnapshot {
    /// Aggregate reduction over successful jobs, `None` when nothing was converted
    pub fn reduction_percent(&self) -> Option<f64> {
        if self.converted == 0 {
            return None;
        }
        reduction_percent(self.bytes_before, self.bytes_after)
    }
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Acquire),
            converted: self.converted.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            bytes_before: self.bytes_before.load(Ordering::Acquire),
            bytes_after: self.bytes_after.load(Ordering::Acquire),
        }
    }
}

/// Folds per-job outcomes into [`Stats`] and prints the per-file line
#[derive(Debug, Default)]
pub struct Aggregator {
    stats: Stats,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one outcome.
    ///
    /// Missing sizes contribute nothing to the byte totals and never turn a success
    /// into a failure.
    pub fn record(&self, outcome: &ConversionOutcome) {
        self.stats.total.fetch_add(1, Ordering::AcqRel);

        if !outcome.success {
            self.stats.failed.fetch_add(1, Ordering::AcqRel);
            console::failure(&format!(
                "{}: {}",
                display_name(&outcome.source),
                outcome.error.as_deref().unwrap_or("conversion failed")
            ));
            return;
        }

        if let Some(size) = outcome.original_size {
            self.stats.bytes_before.fetch_add(size, Ordering::AcqRel);
        }
        if let Some(size) = outcome.converted_size {
            self.stats.bytes_after.fetch_add(size, Ordering::AcqRel);
        }
        self.stats.converted.fetch_add(1, Ordering::AcqRel);

        let reduction = outcome
            .reduction_percent()
            .map(|p| format!(" [{:.1}% reduction]", p))
            .unwrap_or_default();
        console::success(&format!(
            "{} ({}) → {} ({}){}",
            display_name(&outcome.source),
            console::optional_size(outcome.original_size),
            display_name(&outcome.destination),
            console::optional_size(outcome.converted_size),
            reduction
        ));
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
