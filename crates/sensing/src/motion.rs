//! Threshold motion detection over RSSI variance.

use contracts::{MotionState, RssiStatistics};

/// Variance-threshold motion detector.
///
/// No hysteresis: a window straddling the threshold can toggle the
/// decision on consecutive packets.
#[derive(Debug, Clone)]
pub struct MotionDetector {
    threshold: f32,
    last_variance: f32,
}

impl MotionDetector {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            last_variance: 0.0,
        }
    }

    /// Decide motion from the current window statistics.
    ///
    /// Invalid statistics report no motion and keep the last known
    /// variance instead of resetting it.
    #[inline]
    pub fn evaluate(&mut self, stats: &RssiStatistics) -> MotionState {
        if !stats.valid {
            return MotionState {
                motion: false,
                variance: self.last_variance,
            };
        }

        self.last_variance = stats.variance;
        MotionState {
            motion: stats.variance > self.threshold,
            variance: stats.variance,
        }
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[inline]
    pub fn last_variance(&self) -> f32 {
        self.last_variance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(valid: bool, variance: f32) -> RssiStatistics {
        RssiStatistics {
            valid,
            mean: -60.0,
            variance,
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut detector = MotionDetector::new(0.5);
        assert!(!detector.evaluate(&stats(true, 0.5)).motion);
        assert!(detector.evaluate(&stats(true, 0.5001)).motion);
    }

    #[test]
    fn test_zero_variance_no_motion() {
        let mut detector = MotionDetector::new(0.5);
        let state = detector.evaluate(&stats(true, 0.0));
        assert!(!state.motion);
        assert_eq!(state.variance, 0.0);
    }

    #[test]
    fn test_invalid_keeps_last_variance() {
        let mut detector = MotionDetector::new(0.5);
        detector.evaluate(&stats(true, 12.0));

        let state = detector.evaluate(&stats(false, 0.0));
        assert!(!state.motion);
        assert_eq!(state.variance, 12.0);
        assert_eq!(detector.last_variance(), 12.0);
    }

    #[test]
    fn test_toggles_without_hysteresis() {
        let mut detector = MotionDetector::new(1.0);
        assert!(detector.evaluate(&stats(true, 1.1)).motion);
        assert!(!detector.evaluate(&stats(true, 0.9)).motion);
        assert!(detector.evaluate(&stats(true, 1.1)).motion);
    }
}
