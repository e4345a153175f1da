//! Derived sensing state shared between the packet path and the publisher.

use serde::{Deserialize, Serialize};

/// Population statistics over the RSSI window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RssiStatistics {
    /// False until the quorum is reached
    pub valid: bool,
    pub mean: f32,
    pub variance: f32,
}

impl RssiStatistics {
    /// Statistics that have not reached quorum
    pub const INVALID: RssiStatistics = RssiStatistics {
        valid: false,
        mean: 0.0,
        variance: 0.0,
    };
}

/// Latest motion decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub motion: bool,
    /// Last valid RSSI variance
    pub variance: f32,
}

/// Fixed gain values computed at calibration lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainForce {
    pub agc_force: u8,
    pub fft_force: u8,
}
