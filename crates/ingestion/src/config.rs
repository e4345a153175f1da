//! Source metrics and pacing

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Offset from the start of playback at which frame `n` is due.
///
/// Computed in floating point so long runs never wrap; saturates at
/// `Duration::MAX`.
pub(crate) fn pacing_target(interval: Duration, n: u64) -> Duration {
    Duration::try_from_secs_f64(interval.as_secs_f64() * n as f64).unwrap_or(Duration::MAX)
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Frames handed to the callback
    pub frames_received: AtomicU64,

    /// Frames the pipeline refused (foreign peer, empty payload)
    pub frames_rejected: AtomicU64,

    /// Input records that could not be decoded
    pub parse_errors: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record frame delivered
    pub fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record frame rejected downstream
    pub fn record_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record parse error
    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Frames handed to the callback
    pub frames_received: u64,

    /// Frames the pipeline refused
    pub frames_rejected: u64,

    /// Input records that could not be decoded
    pub parse_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacing_target_scales_with_frame_count() {
        let interval = Duration::from_millis(250);
        assert_eq!(pacing_target(interval, 0), Duration::ZERO);
        assert_eq!(pacing_target(interval, 4), Duration::from_secs(1));
        assert_eq!(pacing_target(interval, 100), Duration::from_secs(25));
    }

    #[test]
    fn test_pacing_target_keeps_growing_past_u32() {
        let interval = Duration::from_millis(1);
        let before = pacing_target(interval, u64::from(u32::MAX));
        let after = pacing_target(interval, u64::from(u32::MAX) + 10);
        assert!(after > before);
        assert!(after > Duration::from_secs(4_000_000));
    }

    #[test]
    fn test_pacing_target_saturates() {
        assert_eq!(pacing_target(Duration::MAX, u64::MAX), Duration::MAX);
    }
}
