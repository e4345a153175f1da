//! GainControl - radio gain override hook
//!
//! Invoked exactly once when gain calibration locks.

/// Receiver gain control interface.
pub trait GainControl: Send {
    /// Enable/disable automatic FFT scaling and set its forced value
    fn force_fft_scale(&mut self, enabled: bool, value: u8);

    /// Enable/disable automatic receive gain and set its forced value
    fn force_rx_gain(&mut self, enabled: bool, value: u8);
}

impl<G: GainControl + ?Sized> GainControl for Box<G> {
    fn force_fft_scale(&mut self, enabled: bool, value: u8) {
        (**self).force_fft_scale(enabled, value)
    }

    fn force_rx_gain(&mut self, enabled: bool, value: u8) {
        (**self).force_rx_gain(enabled, value)
    }
}
