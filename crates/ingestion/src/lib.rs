//! # Ingestion
//!
//! Radio-driver side of the sensing pipeline.
//!
//! Responsibilities:
//! - Decode the raw PHY control block and serial diagnostic lines
//! - Print accepted frames as serial diagnostic lines
//! - Provide `CsiSource` implementations (log replay, synthetic mock)
//! - Simulate the radio's gain override registers
//! - Gate start-up on the connectivity collaborator (`LinkGate`)
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use contracts::CsiSource;
//! use ingestion::{LinkGate, MockCsiSource};
//!
//! let gate = LinkGate::connected();
//! gate.wait_connected(timeout).await?;
//!
//! let source = MockCsiSource::with_defaults("mock")?;
//! let shared = pipeline.clone();
//! source.listen(Arc::new(move |frame| {
//!     shared.on_packet(frame.view());
//! }));
//! ```

mod config;
mod error;
mod link;
mod mock;
mod phy;
mod radio_gain;
mod replay;
mod serial_line;
mod serial_out;

// Re-exports
pub use config::{IngestionMetrics, MetricsSnapshot};
pub use contracts::{CsiFrame, CsiSource};
pub use error::{IngestionError, Result};
pub use link::LinkGate;
pub use mock::{MockCsiConfig, MockCsiSource, MockFrameGenerator, MotionBursts};
pub use phy::{decode_phy_gain, PhyGainRecord};
pub use radio_gain::SimulatedRadioGain;
pub use replay::{ReplayConfig, ReplaySource};
pub use serial_line::{
    format_csi_line, is_csi_line, parse_csi_line, write_csi_line, CSI_LINE_PREFIX,
};
pub use serial_out::{SerialLineWriter, STDOUT_TARGET};
