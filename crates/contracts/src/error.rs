//! Layered error definitions
//!
//! Categorized by source: config / decode / transport / link

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Decode Errors =====
    /// Raw driver record / diagnostic line could not be decoded
    #[error("payload decode error: {message}")]
    PayloadDecode { message: String },

    // ===== Transport Errors =====
    /// Publish call reported failure
    #[error("transport '{transport}' publish error: {message}")]
    Publish { transport: String, message: String },

    /// Transport could not be opened
    #[error("transport '{transport}' connection error: {message}")]
    TransportConnection { transport: String, message: String },

    // ===== Link Errors =====
    /// Connectivity collaborator never reported a connected state
    #[error("link not connected after {waited_ms}ms")]
    LinkTimeout { waited_ms: u64 },

    /// Readiness signal dropped before connecting
    #[error("link readiness signal closed")]
    LinkClosed,

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create payload decode error
    pub fn payload_decode(message: impl Into<String>) -> Self {
        Self::PayloadDecode {
            message: message.into(),
        }
    }

    /// Create publish error
    pub fn publish(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Create transport connection error
    pub fn transport_connection(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportConnection {
            transport: transport.into(),
            message: message.into(),
        }
    }
}
