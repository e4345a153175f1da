//! Hand-off between the packet context and the publish context.
//!
//! The producer holds the lock for exactly one bounded `on_packet`; the
//! consumer holds it only while copying state into a preallocated
//! snapshot. Neither side does I/O or unbounded work under the lock.

use std::sync::Arc;

use contracts::{CsiFrameRef, GainControl, GainForce, MotionState};
use parking_lot::Mutex;

use crate::pipeline::{FeaturePipeline, PacketOutcome, PipelineCounters};

/// Consumer-side copy of the pipeline state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensingSnapshot {
    /// Ring contents, oldest first
    pub samples: Vec<i16>,
    pub motion: MotionState,
    pub last_rssi: Option<i8>,
    pub calibration: Option<GainForce>,
    pub counters: PipelineCounters,
}

impl SensingSnapshot {
    /// Snapshot with room for `capacity` samples
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }
}

/// Cloneable handle to a pipeline shared by both execution contexts
pub struct SharedPipeline<G> {
    inner: Arc<Mutex<FeaturePipeline<G>>>,
}

impl<G> Clone for SharedPipeline<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: GainControl> SharedPipeline<G> {
    pub fn new(pipeline: FeaturePipeline<G>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pipeline)),
        }
    }

    /// Producer entry point
    #[inline]
    pub fn on_packet(&self, frame: CsiFrameRef<'_>) -> PacketOutcome {
        self.inner.lock().on_packet(frame)
    }

    /// True when there is nothing to publish
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().ring().is_empty()
    }

    /// Capacity of the underlying sample ring
    pub fn ring_capacity(&self) -> usize {
        self.inner.lock().ring().capacity()
    }

    /// Empty snapshot sized for this pipeline's ring
    pub fn empty_snapshot(&self) -> SensingSnapshot {
        SensingSnapshot::with_capacity(self.ring_capacity())
    }

    /// Copy current state into `out`, reusing its sample buffer.
    ///
    /// Returns false (leaving `out.samples` empty) when the ring is empty.
    pub fn snapshot_into(&self, out: &mut SensingSnapshot) -> bool {
        let pipeline = self.inner.lock();

        pipeline.ring().copy_into(&mut out.samples);
        out.motion = pipeline.motion();
        out.last_rssi = pipeline.rssi().last();
        out.calibration = pipeline.calibrator().force();
        out.counters = pipeline.counters();

        !out.samples.is_empty()
    }

    /// Run `f` with exclusive access to the pipeline
    pub fn with<R>(&self, f: impl FnOnce(&mut FeaturePipeline<G>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
