//! Process-wide metrics (`spec.md` §4.8: "totalProcessed, successCount,
//! failCount, totalTime, avgProcessingTime; updated atomically on each URL
//! outcome"). Grounded in `foofork-riptidecrawler`'s
//! `riptide-workers/src/worker.rs::WorkerStats`.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct JobMetrics {
    total_processed: AtomicU64,
    success_count: AtomicU64,
    fail_count: AtomicU64,
    total_time_ms: AtomicU64,
    // Guards nothing but the averaging computation; kept as the one spot
    // that needs a consistent read of both counters together.
    snapshot_lock: RwLock<()>,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub total_processed: u64,
    pub success_count: u64,
    pub fail_count: u64,
    pub total_time_ms: u64,
    pub avg_processing_time_ms: u64,
}

impl JobMetrics {
    pub fn record(&self, success: bool, elapsed_ms: u64) {
        self.total_processed.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.fail_count.fetch_add(1, Ordering::Relaxed);
        }
        self.total_time_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let _guard = self.snapshot_lock.read();
        let total_processed = self.total_processed.load(Ordering::Relaxed);
        let total_time_ms = self.total_time_ms.load(Ordering::Relaxed);
        let avg = if total_processed > 0 { total_time_ms / total_processed } else { 0 };
        MetricsSnapshot {
            total_processed,
            success_count: self.success_count.load(Ordering::Relaxed),
            fail_count: self.fail_count.load(Ordering::Relaxed),
            total_time_ms,
            avg_processing_time_ms: avg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_recorded_times() {
        let metrics = JobMetrics::default();
        metrics.record(true, 100);
        metrics.record(false, 300);
        let snap = metrics.snapshot();
        assert_eq!(snap.total_processed, 2);
        assert_eq!(snap.success_count, 1);
        assert_eq!(snap.fail_count, 1);
        assert_eq!(snap.avg_processing_time_ms, 200);
    }
}
