//! RecordingTransport - keeps every publish in memory

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use contracts::{ContractError, DeliveryQuality, MessageId, PublishRequest, PublishTransport};
use parking_lot::Mutex;

/// One message captured by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub id: MessageId,
    pub topic: String,
    pub payload: Bytes,
    pub quality: DeliveryQuality,
    pub retain: bool,
}

impl PublishedMessage {
    /// Payload as text (payloads are ASCII)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// In-memory transport for tests and dry runs.
///
/// Clones share the same message log, so a test can keep one clone while
/// the publisher owns another.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    messages: Arc<Mutex<Vec<PublishedMessage>>>,
    failing: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent publishes fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Copy of everything published so far
    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.messages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

impl PublishTransport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn publish(&mut self, request: &PublishRequest) -> Result<MessageId, ContractError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(ContractError::publish("recording", "forced failure"));
        }

        let mut messages = self.messages.lock();
        let id = MessageId(messages.len() as u32 + 1);
        messages.push(PublishedMessage {
            id,
            topic: request.topic.clone(),
            payload: request.payload.clone(),
            quality: request.quality,
            retain: request.retain,
        });
        Ok(id)
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}
