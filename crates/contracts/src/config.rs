//! SensingConfig - Config Loader output
//!
//! Describes the whole sensing node: expected transmitter, buffer sizes,
//! motion threshold, calibration and publishing policy.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::MacAddress;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensingConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub ring: RingConfig,

    #[serde(default)]
    pub rssi: RssiConfig,

    #[serde(default)]
    pub motion: MotionConfig,

    #[serde(default)]
    pub calibration: CalibrationConfig,

    #[serde(default)]
    pub publish: PublishConfig,

    #[serde(default)]
    pub link: LinkConfig,

    #[serde(default)]
    pub transport: TransportConfig,
}

/// Peer identity filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Only frames from this transmitter are processed
    #[serde(default = "default_expected_peer")]
    pub expected_peer: MacAddress,
}

fn default_expected_peer() -> MacAddress {
    MacAddress::new([0x1a, 0x00, 0x00, 0x00, 0x00, 0x00])
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            expected_peer: default_expected_peer(),
        }
    }
}

/// Sample ring sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingConfig {
    /// Total scalar capacity
    #[serde(default = "default_ring_capacity")]
    pub capacity: usize,

    /// Values dropped from the front when an append would overflow
    #[serde(default = "default_evict_block")]
    pub evict_block: usize,
}

fn default_ring_capacity() -> usize {
    1140
}

fn default_evict_block() -> usize {
    114
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            capacity: default_ring_capacity(),
            evict_block: default_evict_block(),
        }
    }
}

impl RingConfig {
    /// Number of values kept after a block eviction
    #[inline]
    pub fn retain_size(&self) -> usize {
        self.capacity.saturating_sub(self.evict_block)
    }
}

/// RSSI window sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RssiConfig {
    #[serde(default = "default_rssi_window")]
    pub window: usize,

    /// Minimum readings before statistics are valid
    #[serde(default = "default_rssi_quorum")]
    pub quorum: usize,
}

fn default_rssi_window() -> usize {
    20
}

fn default_rssi_quorum() -> usize {
    5
}

impl Default for RssiConfig {
    fn default() -> Self {
        Self {
            window: default_rssi_window(),
            quorum: default_rssi_quorum(),
        }
    }
}

/// Motion decision policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Variance strictly above this is motion
    #[serde(default = "default_motion_threshold")]
    pub threshold: f32,
}

fn default_motion_threshold() -> f32 {
    0.5
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            threshold: default_motion_threshold(),
        }
    }
}

/// Gain calibration policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Observations averaged before the gains are locked
    #[serde(default = "default_calibration_packets")]
    pub packets: u32,
}

fn default_true() -> bool {
    true
}

fn default_calibration_packets() -> u32 {
    100
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            packets: default_calibration_packets(),
        }
    }
}

impl CalibrationConfig {
    /// Upper bound on `packets`; keeps the 32-bit gain sums from overflowing
    pub const MAX_PACKETS: u32 = 1 << 24;
}

/// Periodic publish policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_topic")]
    pub topic: String,

    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    #[serde(default)]
    pub retain: bool,

    /// Encoding buffer size; `None` sizes it from the ring capacity
    #[serde(default)]
    pub max_payload_bytes: Option<usize>,
}

fn default_topic() -> String {
    "csi/data".to_string()
}

fn default_period_ms() -> u64 {
    100
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            period_ms: default_period_ms(),
            retain: false,
            max_payload_bytes: None,
        }
    }
}

impl PublishConfig {
    /// Smallest budget that always fits one sample plus the trailer:
    /// `-128` followed by `,1,-128`
    pub const MIN_PAYLOAD_BYTES: usize = 11;

    /// Effective payload budget for a ring of `capacity` values.
    ///
    /// Four characters per sample plus rssi, motion flag and separators,
    /// never below [`Self::MIN_PAYLOAD_BYTES`].
    pub fn payload_budget(&self, capacity: usize) -> usize {
        self.max_payload_bytes.unwrap_or_else(|| {
            capacity
                .saturating_mul(4)
                .saturating_add(6)
                .max(Self::MIN_PAYLOAD_BYTES)
        })
    }
}

/// Connectivity readiness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_connect_timeout_ms() -> u64 {
    20_000
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Publish transport selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    /// Log payload summaries via tracing
    #[default]
    Log,
    /// UDP datagram per publish
    Udp { addr: SocketAddr },
    /// Append one line per publish
    File { path: PathBuf },
}

impl TransportConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            TransportConfig::Log => "log",
            TransportConfig::Udp { .. } => "udp",
            TransportConfig::File { .. } => "file",
        }
    }
}
