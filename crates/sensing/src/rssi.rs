//! Rolling RSSI window with population statistics.

use std::fmt;

use contracts::{ContractError, RssiStatistics};
use ringbuf::{traits::*, HeapRb};

/// Most recent `capacity` signal-strength readings.
///
/// Backed by a heap ring allocated once; `push` overwrites the oldest
/// reading once full. Statistics are recomputed over the whole window on
/// every call (the window is small), so no drift accumulates.
pub struct RssiWindow {
    ring: HeapRb<i8>,
    capacity: usize,
    quorum: usize,
    index: usize,
    filled: bool,
    last: Option<i8>,
}

impl fmt::Debug for RssiWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RssiWindow")
            .field("len", &self.ring.occupied_len())
            .field("capacity", &self.capacity)
            .field("index", &self.index)
            .field("filled", &self.filled)
            .finish()
    }
}

impl RssiWindow {
    /// Create a window of `capacity` readings, valid after `quorum` pushes.
    ///
    /// # Errors
    /// `capacity` must be > 0 and `quorum` in `1..=capacity`.
    pub fn new(capacity: usize, quorum: usize) -> Result<Self, ContractError> {
        if capacity == 0 {
            return Err(ContractError::config_validation(
                "rssi.window",
                "window must be > 0",
            ));
        }
        if quorum == 0 || quorum > capacity {
            return Err(ContractError::config_validation(
                "rssi.quorum",
                format!("quorum ({quorum}) must be in 1..={capacity}"),
            ));
        }

        Ok(Self {
            ring: HeapRb::new(capacity),
            capacity,
            quorum,
            index: 0,
            filled: false,
            last: None,
        })
    }

    /// Record one reading
    #[inline]
    pub fn push(&mut self, value: i8) {
        self.ring.push_overwrite(value);
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
        self.last = Some(value);
    }

    /// Population mean/variance over the valid part of the window
    pub fn statistics(&self) -> RssiStatistics {
        if !self.filled && self.index < self.quorum {
            return RssiStatistics::INVALID;
        }

        let count = self.ring.occupied_len();
        if count == 0 {
            return RssiStatistics::INVALID;
        }
        let n = count as f32;

        let mean = self.ring.iter().map(|&v| f32::from(v)).sum::<f32>() / n;
        let variance = self
            .ring
            .iter()
            .map(|&v| {
                let diff = f32::from(v) - mean;
                diff * diff
            })
            .sum::<f32>()
            / n;

        RssiStatistics {
            valid: true,
            mean,
            variance,
        }
    }

    /// Most recent reading
    #[inline]
    pub fn last(&self) -> Option<i8> {
        self.last
    }

    /// Next write position, always in `0..capacity`
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// True once the window has wrapped at least once
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.filled
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_invalid_below_quorum() {
        let mut window = RssiWindow::new(20, 5).unwrap();
        assert!(!window.statistics().valid);

        for _ in 0..4 {
            window.push(-60);
            assert!(!window.statistics().valid);
        }
    }

    #[test]
    fn test_identical_readings_zero_variance() {
        let mut window = RssiWindow::new(20, 5).unwrap();
        for _ in 0..5 {
            window.push(-60);
        }

        let stats = window.statistics();
        assert!(stats.valid);
        assert_eq!(stats.mean, -60.0);
        assert_eq!(stats.variance, 0.0);
    }

    #[test]
    fn test_alternating_readings_fill_window() {
        let mut window = RssiWindow::new(20, 5).unwrap();
        for i in 0..20 {
            window.push(if i % 2 == 0 { -40 } else { -80 });
        }

        assert!(window.is_filled());
        assert_eq!(window.index(), 0);

        let stats = window.statistics();
        assert!(stats.valid);
        assert!((stats.mean + 60.0).abs() < 1e-4);
        assert!((stats.variance - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_population_variance_over_written_entries() {
        let mut window = RssiWindow::new(20, 5).unwrap();
        for v in [-50, -52, -54, -56, -58, -60] {
            window.push(v);
        }

        // mean -55, deviations ±1, ±3, ±5 -> (1+9+25)*2/6
        let stats = window.statistics();
        assert!((stats.mean + 55.0).abs() < 1e-4);
        assert!((stats.variance - 70.0 / 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_overwrites_oldest_when_full() {
        let mut window = RssiWindow::new(5, 5).unwrap();
        for _ in 0..5 {
            window.push(-90);
        }
        for _ in 0..5 {
            window.push(-30);
        }

        let stats = window.statistics();
        assert_eq!(stats.mean, -30.0);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(window.last(), Some(-30));
    }

    #[test]
    fn test_index_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut window = RssiWindow::new(7, 3).unwrap();

        for n in 1..=100 {
            window.push(rng.random_range(-100..=-20));
            assert!(window.index() < window.capacity());

            let stats = window.statistics();
            if n < 3 {
                assert!(!stats.valid);
            } else {
                assert!(stats.valid);
                assert!(stats.variance >= 0.0);
            }
        }
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(RssiWindow::new(0, 0).is_err());
        assert!(RssiWindow::new(5, 0).is_err());
        assert!(RssiWindow::new(5, 6).is_err());
    }
}
