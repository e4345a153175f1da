//! TelemetryPublisher - periodic observer of the sensing pipeline
//!
//! Each tick copies the shared state, encodes it and hands it to the
//! transport. The ring is never drained; a failed publish is logged and the
//! next tick simply publishes fresh state.

use std::sync::Arc;

use bytes::Bytes;
use contracts::{
    ContractError, DeliveryQuality, GainControl, MessageId, PublishConfig, PublishRequest,
    PublishTransport,
};
use sensing::{SensingSnapshot, SharedPipeline};
use tracing::{debug, instrument, warn};

use crate::encoder::encode_payload;
use crate::metrics::PublisherMetrics;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Ring empty; nothing was encoded or sent
    Skipped,
    /// Payload accepted by the transport
    Published {
        message_id: MessageId,
        bytes: usize,
        truncated: bool,
    },
    /// Publish attempt abandoned for this tick
    Failed,
}

/// Periodic publisher bound to one pipeline and one transport
pub struct TelemetryPublisher<G, T> {
    pipeline: SharedPipeline<G>,
    transport: T,
    topic: String,
    retain: bool,
    max_payload: usize,
    snapshot: SensingSnapshot,
    payload: String,
    metrics: Arc<PublisherMetrics>,
}

impl<G: GainControl, T: PublishTransport> TelemetryPublisher<G, T> {
    /// Create a publisher; buffers are sized once from the ring capacity.
    pub fn new(pipeline: SharedPipeline<G>, transport: T, config: &PublishConfig) -> Self {
        let snapshot = pipeline.empty_snapshot();
        let max_payload = config.payload_budget(pipeline.ring_capacity());

        Self {
            pipeline,
            transport,
            topic: config.topic.clone(),
            retain: config.retain,
            max_payload,
            snapshot,
            payload: String::with_capacity(max_payload),
            metrics: Arc::new(PublisherMetrics::new()),
        }
    }

    /// Run one publish cycle.
    #[instrument(name = "telemetry_tick", skip(self), fields(transport = %self.transport.name()))]
    pub async fn tick(&mut self) -> TickOutcome {
        if !self.pipeline.snapshot_into(&mut self.snapshot) {
            self.metrics.inc_skipped();
            return TickOutcome::Skipped;
        }

        let encoded = encode_payload(
            &self.snapshot.samples,
            self.snapshot.motion.motion,
            self.snapshot.last_rssi,
            self.max_payload,
            &mut self.payload,
        );
        if !encoded.is_complete_frame() {
            self.metrics.inc_failed();
            warn!(
                budget = self.max_payload,
                "Payload budget cannot hold one sample plus the motion/rssi trailer, tick abandoned"
            );
            return TickOutcome::Failed;
        }
        if encoded.truncated {
            debug!(
                budget = self.max_payload,
                sent = encoded.samples_written,
                samples = self.snapshot.samples.len(),
                "Payload truncated"
            );
        }

        let request = PublishRequest {
            topic: self.topic.clone(),
            payload: Bytes::copy_from_slice(self.payload.as_bytes()),
            quality: DeliveryQuality::AtLeastOnce,
            retain: self.retain,
        };
        let bytes = request.payload.len();

        match self.transport.publish(&request).await {
            Ok(message_id) => {
                self.metrics.inc_published(bytes, encoded.truncated);
                debug!(
                    message_id = message_id.0,
                    bytes,
                    variance = self.snapshot.motion.variance,
                    motion = self.snapshot.motion.motion,
                    "Telemetry sent"
                );
                TickOutcome::Published {
                    message_id,
                    bytes,
                    truncated: encoded.truncated,
                }
            }
            Err(e) => {
                self.metrics.inc_failed();
                warn!(transport = %self.transport.name(), error = %e, "Publish failed");
                TickOutcome::Failed
            }
        }
    }

    /// State copied by the most recent tick
    pub fn last_snapshot(&self) -> &SensingSnapshot {
        &self.snapshot
    }

    /// Payload encoded by the most recent non-skipped tick
    pub fn last_payload(&self) -> &str {
        &self.payload
    }

    pub fn metrics(&self) -> &Arc<PublisherMetrics> {
        &self.metrics
    }

    /// Byte budget for one payload
    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Close the underlying transport
    pub async fn close(&mut self) -> Result<(), ContractError> {
        self.transport.close().await
    }
}
