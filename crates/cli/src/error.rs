//! Error types for CLI operations.

use contracts::ContractError;
use ingestion::IngestionError;
use telemetry::TelemetryError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration failed to load or validate
    #[error("Invalid configuration: {0}")]
    Config(#[source] ContractError),

    /// Link never became ready
    #[error("Link not ready: {0}")]
    Link(#[source] ContractError),

    /// Frame source could not be built
    #[error("Source setup failed: {0}")]
    Source(#[from] IngestionError),

    /// Publisher or transport could not be built
    #[error("Telemetry setup failed: {0}")]
    Telemetry(#[from] TelemetryError),

    /// Metrics exporter could not be installed
    #[error("Metrics setup failed: {message}")]
    Metrics { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn metrics(message: impl Into<String>) -> Self {
        Self::Metrics {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
