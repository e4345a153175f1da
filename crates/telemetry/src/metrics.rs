//! Publisher metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the publisher worker and its handle
#[derive(Debug, Default)]
pub struct PublisherMetrics {
    /// Ticks that handed a payload to the transport successfully
    published: AtomicU64,
    /// Ticks that found the ring empty
    skipped: AtomicU64,
    /// Ticks abandoned (transport failure or payload budget)
    failed: AtomicU64,
    /// Published payloads cut short by the byte budget
    truncated: AtomicU64,
    /// Total payload bytes handed to the transport
    bytes: AtomicU64,
}

impl PublisherMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn inc_published(&self, bytes: usize, truncated: bool) {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        if truncated {
            self.truncated.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn truncated(&self) -> u64 {
        self.truncated.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> PublisherMetricsSnapshot {
        PublisherMetricsSnapshot {
            published: self.published(),
            skipped: self.skipped(),
            failed: self.failed(),
            truncated: self.truncated(),
            bytes: self.bytes(),
        }
    }
}

/// Snapshot of publisher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublisherMetricsSnapshot {
    pub published: u64,
    pub skipped: u64,
    pub failed: u64,
    pub truncated: u64,
    pub bytes: u64,
}

impl PublisherMetricsSnapshot {
    /// Total ticks observed
    pub fn ticks(&self) -> u64 {
        self.published + self.skipped + self.failed
    }
}
