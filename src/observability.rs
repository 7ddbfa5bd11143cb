//! Counters for the file writer

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared between the writer thread and whoever reports on it
#[derive(Debug, Default)]
pub struct WriterMetrics {
    entries_written: AtomicU64,
    entries_dropped: AtomicU64,
    write_failures: AtomicU64,
    rotations: AtomicU64,
    archives_pruned: AtomicU64,
}

impl WriterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry_written(&self) {
        self.entries_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entries_dropped(&self, count: u64) {
        self.entries_dropped.fetch_add(count, Ordering::Relaxed);
        tracing::debug!(counter = "entries_dropped", count, "Metric incremented");
    }

    pub fn write_failed(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "write_failures", "Metric incremented");
    }

    pub fn rotated(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "rotations", "Metric incremented");
    }

    pub fn archives_pruned(&self, count: u64) {
        self.archives_pruned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            entries_written: self.entries_written.load(Ordering::Relaxed),
            entries_dropped: self.entries_dropped.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            archives_pruned: self.archives_pruned.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub entries_written: u64,
    pub entries_dropped: u64,
    pub write_failures: u64,
    pub rotations: u64,
    pub archives_pruned: u64,
}
