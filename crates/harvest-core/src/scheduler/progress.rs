//! Running counters and progress snapshots for crawls.

/// Per-item success/error counters aggregated across batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTotals {
    pub successes: u64,
    pub errors: u64,
}

impl BatchTotals {
    pub fn record(&mut self, ok: bool) {
        if ok {
            self.successes += 1;
        } else {
            self.errors += 1;
        }
    }

    pub fn attempted(&self) -> u64 {
        self.successes + self.errors
    }
}

/// Snapshot sent to the progress display after every batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlProgress {
    /// Items finished so far in this run.
    pub done: usize,
    /// Items in this run's work list.
    pub total: usize,
    pub totals: BatchTotals,
    /// Cumulative outcome count (resume cursor total).
    pub global_total: u64,
}

impl CrawlProgress {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.done as f64 / self.total as f64).min(1.0)
    }
}
