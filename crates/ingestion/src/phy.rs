//! Raw PHY control block decoding
//!
//! The radio driver prefixes each CSI delivery with a 48-byte receive
//! control block. Only the two 8-bit gain fields are consumed here; every
//! other word is reserved.

use bytemuck::{Pod, Zeroable};
use contracts::{ContractError, PhyGain};

/// Overlay of the 48-byte receive control block (little-endian).
///
/// | bytes  | field      | bits |
/// |--------|------------|------|
/// | 0..20  | reserved   | 5×32 |
/// | 20..22 | reserved   | 16   |
/// | 22     | `fft_gain` | 8    |
/// | 23     | `agc_gain` | 8    |
/// | 24..48 | reserved   | 6×32 |
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct PhyGainRecord {
    reserved_head: [u32; 5],
    reserved_mid: u16,
    pub fft_gain: u8,
    pub agc_gain: u8,
    reserved_tail: [u32; 6],
}

impl PhyGainRecord {
    /// Size of the raw block in bytes
    pub const SIZE: usize = std::mem::size_of::<PhyGainRecord>();

    /// Record carrying only the given gains
    pub fn new(gain: PhyGain) -> Self {
        Self {
            fft_gain: gain.fft_gain,
            agc_gain: gain.agc_gain,
            ..Self::zeroed()
        }
    }

    #[inline]
    pub fn gain(&self) -> PhyGain {
        PhyGain {
            agc_gain: self.agc_gain,
            fft_gain: self.fft_gain,
        }
    }
}

/// Extract gain telemetry from a raw control block.
///
/// Accepts any alignment; bytes past the first [`PhyGainRecord::SIZE`] are
/// ignored.
///
/// # Errors
/// Returns a decode error when fewer than [`PhyGainRecord::SIZE`] bytes are
/// given.
pub fn decode_phy_gain(raw: &[u8]) -> Result<PhyGain, ContractError> {
    let block = raw.get(..PhyGainRecord::SIZE).ok_or_else(|| {
        ContractError::payload_decode(format!(
            "PHY record needs {} bytes, got {}",
            PhyGainRecord::SIZE,
            raw.len()
        ))
    })?;

    let record: PhyGainRecord = bytemuck::pod_read_unaligned(block);
    Ok(record.gain())
}
