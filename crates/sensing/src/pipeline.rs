//! FeaturePipeline - single entry point for the driver callback.

use contracts::{
    ContractError, CsiFrameRef, GainControl, GainForce, MacAddress, MotionState, PhyGain,
    SensingConfig,
};
use tracing::debug;

use crate::calibration::GainCalibrator;
use crate::motion::MotionDetector;
use crate::ring::SampleRing;
use crate::rssi::RssiWindow;

/// Result of handling one frame. The producer path never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketOutcome {
    /// Frame processed; carries the forced gains if this frame locked calibration
    Accepted { locked: Option<GainForce> },
    /// Frame from another transmitter
    RejectedPeer,
    /// Frame without CSI values
    EmptyPayload,
}

/// Running counters, read by the consumer through snapshots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineCounters {
    pub accepted: u64,
    pub rejected_peer: u64,
    pub empty_payload: u64,
    pub evictions: u64,
    pub truncated: u64,
}

/// Orchestrates ring, RSSI window, motion detector and gain calibrator.
///
/// Everything is sized at construction; `on_packet` neither allocates nor
/// blocks.
#[derive(Debug)]
pub struct FeaturePipeline<G> {
    expected_peer: MacAddress,
    ring: SampleRing,
    rssi: RssiWindow,
    detector: MotionDetector,
    motion: MotionState,
    calibrator: GainCalibrator<G>,
    accepted: u64,
    rejected_peer: u64,
    empty_payload: u64,
}

impl<G: GainControl> FeaturePipeline<G> {
    /// Build a pipeline from validated configuration.
    ///
    /// # Errors
    /// Returns a validation error for inconsistent sizes; this is the only
    /// fatal error class and surfaces before any source is armed.
    pub fn new(config: &SensingConfig, gain_control: G) -> Result<Self, ContractError> {
        if !config.motion.threshold.is_finite() || config.motion.threshold < 0.0 {
            return Err(ContractError::config_validation(
                "motion.threshold",
                format!(
                    "threshold must be finite and >= 0, got {}",
                    config.motion.threshold
                ),
            ));
        }

        Ok(Self {
            expected_peer: config.device.expected_peer,
            ring: SampleRing::new(config.ring.capacity, config.ring.evict_block)?,
            rssi: RssiWindow::new(config.rssi.window, config.rssi.quorum)?,
            detector: MotionDetector::new(config.motion.threshold),
            motion: MotionState::default(),
            calibrator: GainCalibrator::new(
                gain_control,
                config.calibration.packets,
                config.calibration.enabled,
            )?,
            accepted: 0,
            rejected_peer: 0,
            empty_payload: 0,
        })
    }

    /// Handle one received frame.
    ///
    /// Order: peer filter, RSSI push, motion update, CSI append, gain
    /// calibration. Motion state therefore always reflects the window that
    /// includes this frame's RSSI by the time its CSI is buffered.
    #[inline]
    pub fn on_packet(&mut self, frame: CsiFrameRef<'_>) -> PacketOutcome {
        self.ingest(frame.source, frame.rssi, frame.gain, frame.csi.len(), |ring| {
            ring.append(frame.csi)
        })
    }

    /// Handle a frame whose CSI values are already 16-bit.
    #[inline]
    pub fn on_packet_wide(
        &mut self,
        source: MacAddress,
        rssi: i8,
        gain: PhyGain,
        csi: &[i16],
    ) -> PacketOutcome {
        self.ingest(source, rssi, gain, csi.len(), |ring| ring.append_i16(csi))
    }

    #[inline]
    fn ingest(
        &mut self,
        source: MacAddress,
        rssi: i8,
        gain: PhyGain,
        csi_len: usize,
        append: impl FnOnce(&mut SampleRing),
    ) -> PacketOutcome {
        if source != self.expected_peer {
            self.rejected_peer += 1;
            debug!(
                source = %source,
                expected = %self.expected_peer,
                "source mismatch, dropping frame"
            );
            return PacketOutcome::RejectedPeer;
        }

        if csi_len == 0 {
            self.empty_payload += 1;
            debug!(source = %source, "empty CSI payload, dropping frame");
            return PacketOutcome::EmptyPayload;
        }

        self.rssi.push(rssi);
        self.motion = self.detector.evaluate(&self.rssi.statistics());
        append(&mut self.ring);
        let locked = self.calibrator.observe(gain);

        self.accepted += 1;
        PacketOutcome::Accepted { locked }
    }

    #[inline]
    pub fn motion(&self) -> MotionState {
        self.motion
    }

    #[inline]
    pub fn ring(&self) -> &SampleRing {
        &self.ring
    }

    #[inline]
    pub fn rssi(&self) -> &RssiWindow {
        &self.rssi
    }

    #[inline]
    pub fn calibrator(&self) -> &GainCalibrator<G> {
        &self.calibrator
    }

    pub fn expected_peer(&self) -> MacAddress {
        self.expected_peer
    }

    pub fn counters(&self) -> PipelineCounters {
        PipelineCounters {
            accepted: self.accepted,
            rejected_peer: self.rejected_peer,
            empty_payload: self.empty_payload,
            evictions: self.ring.evictions(),
            truncated: self.ring.truncated(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::NoopGainControl;
    use contracts::CsiFrame;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const PEER: MacAddress = MacAddress::new([0x1a, 0, 0, 0, 0, 0]);

    fn frame(source: MacAddress, rssi: i8, csi: Vec<i8>) -> CsiFrame {
        CsiFrame {
            source,
            rssi,
            gain: PhyGain {
                agc_gain: 30,
                fft_gain: 4,
            },
            csi,
            ..Default::default()
        }
    }

    fn pipeline() -> FeaturePipeline<NoopGainControl> {
        FeaturePipeline::new(&SensingConfig::default(), NoopGainControl).unwrap()
    }

    #[test]
    fn test_rejects_foreign_peer_without_state_change() {
        let mut p = pipeline();
        let other = MacAddress::new([0x1a, 0, 0, 0, 0, 1]);

        let outcome = p.on_packet(frame(other, -40, vec![1, 2, 3]).view());
        assert_eq!(outcome, PacketOutcome::RejectedPeer);
        assert!(p.ring().is_empty());
        assert!(p.rssi().is_empty());
        assert_eq!(p.counters().rejected_peer, 1);
    }

    #[test]
    fn test_empty_payload_dropped() {
        let mut p = pipeline();
        let outcome = p.on_packet(frame(PEER, -40, vec![]).view());
        assert_eq!(outcome, PacketOutcome::EmptyPayload);
        assert!(p.rssi().is_empty());
    }

    #[test]
    fn test_empty_frame_from_foreign_peer_is_rejected_by_identity() {
        let mut p = pipeline();
        let other = MacAddress::new([0x1a, 0, 0, 0, 0, 1]);

        let outcome = p.on_packet(frame(other, -40, vec![]).view());
        assert_eq!(outcome, PacketOutcome::RejectedPeer);
        assert_eq!(p.counters().rejected_peer, 1);
        assert_eq!(p.counters().empty_payload, 0);
    }

    #[test]
    fn test_accepted_updates_all_state() {
        let mut p = pipeline();
        for _ in 0..5 {
            let outcome = p.on_packet(frame(PEER, -60, vec![1, -1]).view());
            assert_eq!(outcome, PacketOutcome::Accepted { locked: None });
        }

        assert_eq!(p.ring().len(), 10);
        assert_eq!(p.rssi().last(), Some(-60));
        assert!(!p.motion().motion);
        assert_eq!(p.counters().accepted, 5);
    }

    #[test]
    fn test_alternating_rssi_detects_motion() {
        let mut p = pipeline();
        for i in 0..20 {
            let rssi = if i % 2 == 0 { -40 } else { -80 };
            p.on_packet(frame(PEER, rssi, vec![0; 4]).view());
        }

        let motion = p.motion();
        assert!(motion.motion);
        assert!(motion.variance > 100.0);
    }

    #[test]
    fn test_calibration_locks_on_hundredth_packet() {
        let mut p = pipeline();
        for _ in 0..99 {
            let outcome = p.on_packet(frame(PEER, -50, vec![1]).view());
            assert_eq!(outcome, PacketOutcome::Accepted { locked: None });
        }

        let outcome = p.on_packet(frame(PEER, -50, vec![1]).view());
        assert_eq!(
            outcome,
            PacketOutcome::Accepted {
                locked: Some(GainForce {
                    agc_force: 30,
                    fft_force: 4
                })
            }
        );
        assert!(p.calibrator().is_locked());
    }

    #[test]
    fn test_wide_values_bypass_widening() {
        let mut p = pipeline();
        let gain = PhyGain::default();
        p.on_packet_wide(PEER, -50, gain, &[1000, -1000]);
        assert_eq!(p.ring().snapshot(), &[1000, -1000]);
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let mut config = SensingConfig::default();
        config.motion.threshold = -1.0;
        assert!(FeaturePipeline::new(&config, NoopGainControl).is_err());
    }

    #[test]
    fn test_identical_input_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(42);
        let frames: Vec<CsiFrame> = (0..500)
            .map(|_| {
                let len = rng.random_range(1..120);
                let csi = (0..len).map(|_| rng.random::<i8>()).collect();
                frame(PEER, rng.random_range(-90..=-30), csi)
            })
            .collect();

        let mut a = pipeline();
        let mut b = pipeline();
        for f in &frames {
            a.on_packet(f.view());
        }
        for f in &frames {
            b.on_packet(f.view());
        }

        assert_eq!(a.motion(), b.motion());
        assert_eq!(a.ring().snapshot(), b.ring().snapshot());
        assert_eq!(a.counters(), b.counters());
    }
}
