//! LogTransport - reports each publish via tracing

use contracts::{ContractError, MessageId, PublishRequest, PublishTransport};
use tracing::{debug, info, instrument};

/// Transport that logs publishes instead of sending them
pub struct LogTransport {
    name: String,
    next_id: u32,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_id: 1,
        }
    }
}

impl PublishTransport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_transport_publish",
        skip(self, request),
        fields(transport = %self.name, topic = %request.topic)
    )]
    async fn publish(&mut self, request: &PublishRequest) -> Result<MessageId, ContractError> {
        let id = MessageId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        info!(
            transport = %self.name,
            topic = %request.topic,
            qos = request.quality.qos(),
            retain = request.retain,
            bytes = request.payload.len(),
            message_id = id.0,
            "Telemetry published"
        );
        debug!(payload = %String::from_utf8_lossy(&request.payload), "Telemetry payload");

        Ok(id)
    }

    #[instrument(name = "log_transport_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(transport = %self.name, "LogTransport closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use contracts::DeliveryQuality;

    fn request() -> PublishRequest {
        PublishRequest {
            topic: "csi/data".to_string(),
            payload: Bytes::from_static(b"1,2,0,-50"),
            quality: DeliveryQuality::AtLeastOnce,
            retain: false,
        }
    }

    #[tokio::test]
    async fn test_log_transport_assigns_increasing_ids() {
        let mut transport = LogTransport::new("test_log");
        let first = transport.publish(&request()).await.unwrap();
        let second = transport.publish(&request()).await.unwrap();
        assert_eq!(first, MessageId(1));
        assert_eq!(second, MessageId(2));
    }

    #[tokio::test]
    async fn test_log_transport_name() {
        let transport = LogTransport::new("my_logger");
        assert_eq!(transport.name(), "my_logger");
    }
}
