//! One-shot receiver gain calibration.
//!
//! The first K packets' AGC/FFT gains are averaged, then forced into the
//! radio once. After lock the hardware loop is no longer fought by
//! continuous recalculation.

use contracts::{CalibrationConfig, ContractError, GainControl, GainForce, PhyGain};
use tracing::info;

/// Gain control that ignores overrides (calibration-disabled or host runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGainControl;

impl GainControl for NoopGainControl {
    fn force_fft_scale(&mut self, _enabled: bool, _value: u8) {}

    fn force_rx_gain(&mut self, _enabled: bool, _value: u8) {}
}

/// Averages early gain telemetry and locks it in.
#[derive(Debug)]
pub struct GainCalibrator<G> {
    control: G,
    target: u32,
    enabled: bool,
    agc_sum: u32,
    fft_sum: u32,
    observed: u32,
    force: Option<GainForce>,
}

impl<G: GainControl> GainCalibrator<G> {
    /// Create a calibrator locking after `packets` observations.
    ///
    /// # Errors
    /// `packets` must be in `1..=CalibrationConfig::MAX_PACKETS`.
    pub fn new(control: G, packets: u32, enabled: bool) -> Result<Self, ContractError> {
        if packets == 0 || packets > CalibrationConfig::MAX_PACKETS {
            return Err(ContractError::config_validation(
                "calibration.packets",
                format!(
                    "packets ({packets}) must be in 1..={}",
                    CalibrationConfig::MAX_PACKETS
                ),
            ));
        }

        Ok(Self {
            control,
            target: packets,
            enabled,
            agc_sum: 0,
            fft_sum: 0,
            observed: 0,
            force: None,
        })
    }

    /// Feed one packet's gains.
    ///
    /// Returns the forced values on the observation that locks; `None`
    /// otherwise. A no-op once locked or when disabled.
    #[inline]
    pub fn observe(&mut self, gain: PhyGain) -> Option<GainForce> {
        if !self.enabled || self.force.is_some() {
            return None;
        }

        self.agc_sum += u32::from(gain.agc_gain);
        self.fft_sum += u32::from(gain.fft_gain);
        self.observed += 1;

        if self.observed < self.target {
            return None;
        }

        // Average of u8 values always fits in u8
        let force = GainForce {
            agc_force: (self.agc_sum / self.target) as u8,
            fft_force: (self.fft_sum / self.target) as u8,
        };
        self.control.force_fft_scale(true, force.fft_force);
        self.control.force_rx_gain(true, force.agc_force);
        self.force = Some(force);

        info!(
            fft_force = force.fft_force,
            agc_force = force.agc_force,
            packets = self.target,
            "gain calibration locked"
        );

        Some(force)
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.force.is_some()
    }

    /// Locked gain values, if calibration has completed
    #[inline]
    pub fn force(&self) -> Option<GainForce> {
        self.force
    }

    /// Observations accumulated so far
    #[inline]
    pub fn observed(&self) -> u32 {
        self.observed
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Discard accumulators and the lock.
    ///
    /// Does not release the forced gains in hardware; the next lock
    /// overrides them.
    pub fn reset(&mut self) {
        self.agc_sum = 0;
        self.fft_sum = 0;
        self.observed = 0;
        self.force = None;
    }

    /// Access the underlying gain control
    pub fn control(&self) -> &G {
        &self.control
    }
}
