//! CsiFrame - radio driver output
//!
//! One CSI delivery per received radio frame, with the PHY telemetry the
//! driver reports alongside it.

use serde::{Deserialize, Serialize};

use crate::MacAddress;

/// Receiver gain stages reported per packet (8 bits each in hardware)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhyGain {
    /// Automatic gain control stage
    pub agc_gain: u8,
    /// FFT scaling stage
    pub fft_gain: u8,
}

/// Owned CSI frame as delivered by a source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsiFrame {
    /// Transmitter identity
    pub source: MacAddress,

    /// Received signal strength (dBm)
    pub rssi: i8,

    /// PHY rate index
    #[serde(default)]
    pub rate: u8,

    /// Noise floor (dBm)
    #[serde(default)]
    pub noise_floor: i8,

    /// Primary channel
    #[serde(default)]
    pub channel: u8,

    /// Local receive timestamp (microseconds, wraps)
    #[serde(default)]
    pub timestamp_us: u32,

    /// Length of the received packet
    #[serde(default)]
    pub sig_len: u16,

    /// Driver receive state (0 = ok)
    #[serde(default)]
    pub rx_state: u8,

    /// First four CSI bytes are invalid (hardware quirk)
    #[serde(default)]
    pub first_word_invalid: bool,

    /// Gain telemetry
    #[serde(default)]
    pub gain: PhyGain,

    /// Raw CSI values (interleaved imaginary/real per subcarrier)
    pub csi: Vec<i8>,
}

impl CsiFrame {
    /// Borrowed view consumed by the producer path
    #[inline]
    pub fn view(&self) -> CsiFrameRef<'_> {
        CsiFrameRef {
            source: self.source,
            rssi: self.rssi,
            gain: self.gain,
            csi: &self.csi,
        }
    }
}

/// Bounds-checked view over one delivery.
///
/// The producer path only ever sees this view, so nothing is copied until
/// the CSI values land in the sample ring.
#[derive(Debug, Clone, Copy)]
pub struct CsiFrameRef<'a> {
    pub source: MacAddress,
    pub rssi: i8,
    pub gain: PhyGain,
    pub csi: &'a [i8],
}
