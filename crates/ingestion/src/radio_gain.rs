//! Simulated radio gain registers
//!
//! Stands in for the driver's gain override calls when running without a
//! radio. The mock source reads the overrides back, so once calibration
//! locks, generated frames report the forced gains.

use std::sync::Arc;

use contracts::{GainControl, PhyGain};
use parking_lot::Mutex;
use tracing::info;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Overrides {
    fft: Option<u8>,
    agc: Option<u8>,
}

/// Cloneable handle to one set of simulated gain registers
#[derive(Debug, Clone, Default)]
pub struct SimulatedRadioGain {
    overrides: Arc<Mutex<Overrides>>,
}

impl SimulatedRadioGain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forced FFT scale, if automatic scaling is disabled
    pub fn forced_fft(&self) -> Option<u8> {
        self.overrides.lock().fft
    }

    /// Forced receive gain, if AGC is disabled
    pub fn forced_agc(&self) -> Option<u8> {
        self.overrides.lock().agc
    }

    /// Apply the overrides to a measured gain
    pub fn apply(&self, measured: PhyGain) -> PhyGain {
        let overrides = *self.overrides.lock();
        PhyGain {
            agc_gain: overrides.agc.unwrap_or(measured.agc_gain),
            fft_gain: overrides.fft.unwrap_or(measured.fft_gain),
        }
    }
}

impl GainControl for SimulatedRadioGain {
    fn force_fft_scale(&mut self, enabled: bool, value: u8) {
        self.overrides.lock().fft = enabled.then_some(value);
        info!(enabled, value, "radio fft scale override");
    }

    fn force_rx_gain(&mut self, enabled: bool, value: u8) {
        self.overrides.lock().agc = enabled.then_some(value);
        info!(enabled, value, "radio rx gain override");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_shared_between_clones() {
        let radio = SimulatedRadioGain::new();
        let mut control = radio.clone();

        let measured = PhyGain {
            agc_gain: 31,
            fft_gain: 5,
        };
        assert_eq!(radio.apply(measured), measured);

        control.force_fft_scale(true, 4);
        control.force_rx_gain(true, 30);

        assert_eq!(radio.forced_fft(), Some(4));
        assert_eq!(radio.forced_agc(), Some(30));
        assert_eq!(
            radio.apply(measured),
            PhyGain {
                agc_gain: 30,
                fft_gain: 4
            }
        );

        control.force_rx_gain(false, 0);
        assert_eq!(radio.forced_agc(), None);
    }
}
