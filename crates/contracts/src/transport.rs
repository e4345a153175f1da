//! PublishTransport trait - telemetry output interface
//!
//! Publish/subscribe channel the periodic publisher hands payloads to.
//! Broker session handling lives entirely behind this trait.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Delivery quality hint (maps onto MQTT QoS 0/1/2)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryQuality {
    AtMostOnce,
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

impl DeliveryQuality {
    /// Numeric QoS level
    #[inline]
    pub fn qos(self) -> u8 {
        match self {
            DeliveryQuality::AtMostOnce => 0,
            DeliveryQuality::AtLeastOnce => 1,
            DeliveryQuality::ExactlyOnce => 2,
        }
    }
}

/// Identifier assigned by the transport to an accepted message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u32);

/// One outbound publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub topic: String,
    pub payload: Bytes,
    pub quality: DeliveryQuality,
    pub retain: bool,
}

/// Publish transport trait
///
/// All transport implementations must implement this trait.
#[trait_variant::make(PublishTransport: Send)]
pub trait LocalPublishTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Hand one message to the transport
    ///
    /// # Errors
    /// Returns a publish error when the transport rejects the message.
    /// Callers never retry; the next tick publishes fresh state.
    async fn publish(&mut self, request: &PublishRequest) -> Result<MessageId, ContractError>;

    /// Close transport
    async fn close(&mut self) -> Result<(), ContractError>;
}
