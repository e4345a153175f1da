//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the sensing workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Execution model
//! - The radio driver delivers one [`CsiFrame`] per received packet on a
//!   producer context that must never block or fail.
//! - A periodic consumer context reads the derived state and hands a textual
//!   payload to a [`PublishTransport`].

mod config;
mod error;
mod frame;
mod gain_control;
mod link;
mod mac;
mod source;
mod state;
mod transport;

pub use config::*;
pub use error::*;
pub use frame::*;
pub use gain_control::GainControl;
pub use link::LinkState;
pub use mac::MacAddress;
pub use source::{CsiFrameCallback, CsiSource};
pub use state::*;
pub use transport::*;
