//! # Sensing
//!
//! Real-time CSI ingestion and feature pipeline.
//!
//! Responsibilities:
//! - Bounded sample ring with block eviction
//! - RSSI window statistics and motion decision
//! - One-shot gain calibration
//! - Consistent snapshots for the periodic publisher
//!
//! ## Usage
//!
//! ```ignore
//! use sensing::{FeaturePipeline, SharedPipeline};
//!
//! let pipeline = FeaturePipeline::new(&config, radio_gain)?;
//! let shared = SharedPipeline::new(pipeline);
//!
//! // producer context (driver callback)
//! shared.on_packet(frame.view());
//!
//! // consumer context (timer)
//! let mut snapshot = shared.empty_snapshot();
//! shared.snapshot_into(&mut snapshot);
//! ```

mod calibration;
mod motion;
mod pipeline;
mod ring;
mod rssi;
mod shared;

pub use calibration::{GainCalibrator, NoopGainControl};
pub use motion::MotionDetector;
pub use pipeline::{FeaturePipeline, PacketOutcome, PipelineCounters};
pub use ring::SampleRing;
pub use rssi::RssiWindow;
pub use shared::{SensingSnapshot, SharedPipeline};

// Re-export contracts types
pub use contracts::{GainForce, MotionState, RssiStatistics};
