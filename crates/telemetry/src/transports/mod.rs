//! Transport implementations
//!
//! Contains LogTransport, UdpTransport, FileTransport, and RecordingTransport.

mod file;
mod log;
mod recording;
mod udp;

pub use self::file::FileTransport;
pub use self::log::LogTransport;
pub use self::recording::{PublishedMessage, RecordingTransport};
pub use self::udp::UdpTransport;

use contracts::{ContractError, MessageId, PublishRequest, PublishTransport, TransportConfig};
use tracing::info;

use crate::TelemetryError;

/// Transport selected at runtime from configuration
pub enum AnyTransport {
    Log(LogTransport),
    Udp(UdpTransport),
    File(FileTransport),
    Recording(RecordingTransport),
}

impl PublishTransport for AnyTransport {
    fn name(&self) -> &str {
        match self {
            AnyTransport::Log(t) => t.name(),
            AnyTransport::Udp(t) => t.name(),
            AnyTransport::File(t) => t.name(),
            AnyTransport::Recording(t) => t.name(),
        }
    }

    async fn publish(&mut self, request: &PublishRequest) -> Result<MessageId, ContractError> {
        match self {
            AnyTransport::Log(t) => t.publish(request).await,
            AnyTransport::Udp(t) => t.publish(request).await,
            AnyTransport::File(t) => t.publish(request).await,
            AnyTransport::Recording(t) => t.publish(request).await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            AnyTransport::Log(t) => t.close().await,
            AnyTransport::Udp(t) => t.close().await,
            AnyTransport::File(t) => t.close().await,
            AnyTransport::Recording(t) => t.close().await,
        }
    }
}

/// Build the configured transport
pub async fn transport_from_config(
    config: &TransportConfig,
) -> Result<AnyTransport, TelemetryError> {
    let transport = match config {
        TransportConfig::Log => AnyTransport::Log(LogTransport::new("log")),
        TransportConfig::Udp { addr } => AnyTransport::Udp(
            UdpTransport::new("udp", *addr)
                .await
                .map_err(|e| TelemetryError::transport_creation("udp", e.to_string()))?,
        ),
        TransportConfig::File { path } => AnyTransport::File(
            FileTransport::new("file", path)
                .map_err(|e| TelemetryError::transport_creation("file", e.to_string()))?,
        ),
    };

    info!(transport = config.kind(), "Transport created");
    Ok(transport)
}
