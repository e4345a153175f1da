//! Telemetry error types

use thiserror::Error;

/// Telemetry-specific errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Transport creation error
    #[error("failed to create transport '{name}': {message}")]
    TransportCreation { name: String, message: String },

    /// Publisher worker ended abnormally
    #[error("publisher worker failed: {0}")]
    Worker(String),

    /// Transport error (from contract)
    #[error("transport error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelemetryError {
    /// Create a transport creation error
    pub fn transport_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
