//! Mock CSI source
//!
//! Generates synthetic frames for runs without a radio. Output is fully
//! determined by the seed, so tests can assert on exact sequences.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{CsiFrame, CsiFrameCallback, CsiSource, MacAddress, PhyGain};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::config::{pacing_target, IngestionMetrics};
use crate::error::{IngestionError, Result};
use crate::phy::{decode_phy_gain, PhyGainRecord};
use crate::radio_gain::SimulatedRadioGain;

/// Periodic RSSI disturbance imitating a person moving through the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionBursts {
    /// A burst starts every `every_frames` frames
    pub every_frames: u64,
    /// Frames per burst
    pub burst_frames: u64,
    /// RSSI swing (dB) around the base during a burst
    pub swing: i8,
}

impl Default for MotionBursts {
    fn default() -> Self {
        Self {
            every_frames: 200,
            burst_frames: 60,
            swing: 12,
        }
    }
}

/// Mock source configuration
#[derive(Debug, Clone)]
pub struct MockCsiConfig {
    /// Transmitter identity stamped on generated frames
    pub peer: MacAddress,
    /// Send frequency (Hz)
    pub rate_hz: f64,
    /// CSI values per frame
    pub csi_len: usize,
    /// Quiet-room RSSI (dBm)
    pub base_rssi: i8,
    /// Max RSSI deviation outside bursts
    pub rssi_jitter: i8,
    /// Motion bursts, if any
    pub motion: Option<MotionBursts>,
    /// Nominal gain telemetry (±1 jitter is added)
    pub gain: PhyGain,
    /// Fraction of frames stamped with a foreign transmitter
    pub foreign_ratio: f64,
    /// RNG seed
    pub seed: u64,
}

impl Default for MockCsiConfig {
    fn default() -> Self {
        Self {
            peer: MacAddress::new([0x1a, 0x00, 0x00, 0x00, 0x00, 0x00]),
            rate_hz: 100.0,
            csi_len: 128,
            base_rssi: -55,
            rssi_jitter: 1,
            motion: Some(MotionBursts::default()),
            gain: PhyGain {
                agc_gain: 30,
                fft_gain: 4,
            },
            foreign_ratio: 0.0,
            seed: 0x5eed,
        }
    }
}

impl MockCsiConfig {
    fn validate(&self) -> Result<()> {
        if !(self.rate_hz.is_finite() && self.rate_hz > 0.0) {
            return Err(IngestionError::InvalidConfig {
                field: "rate_hz",
                message: format!("must be finite and > 0, got {}", self.rate_hz),
            });
        }
        if self.csi_len == 0 {
            return Err(IngestionError::InvalidConfig {
                field: "csi_len",
                message: "must be > 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.foreign_ratio) {
            return Err(IngestionError::InvalidConfig {
                field: "foreign_ratio",
                message: format!("must be in [0, 1], got {}", self.foreign_ratio),
            });
        }
        if let Some(motion) = self.motion {
            if motion.every_frames == 0 || motion.burst_frames > motion.every_frames {
                return Err(IngestionError::InvalidConfig {
                    field: "motion",
                    message: "burst_frames must be <= every_frames and every_frames > 0"
                        .to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Deterministic frame generator behind [`MockCsiSource`]
#[derive(Debug)]
pub struct MockFrameGenerator {
    config: MockCsiConfig,
    radio: Option<SimulatedRadioGain>,
    foreign: MacAddress,
    rng: StdRng,
    rx_ctrl: [u8; PhyGainRecord::SIZE],
    frame_no: u64,
    started: Instant,
}

impl MockFrameGenerator {
    pub fn new(config: MockCsiConfig) -> Self {
        let mut foreign = config.peer.octets();
        foreign[5] ^= 0xff;

        Self {
            rng: StdRng::seed_from_u64(config.seed),
            foreign: MacAddress::new(foreign),
            radio: None,
            config,
            rx_ctrl: [0; PhyGainRecord::SIZE],
            frame_no: 0,
            started: Instant::now(),
        }
    }

    /// Report gains through `radio`'s overrides once they are forced
    pub fn with_radio(mut self, radio: SimulatedRadioGain) -> Self {
        self.radio = Some(radio);
        self
    }

    /// True while frame `n` falls inside a motion burst
    pub fn in_burst(&self, n: u64) -> bool {
        self.config
            .motion
            .is_some_and(|m| n % m.every_frames >= m.every_frames - m.burst_frames)
    }

    /// Overwrite `frame` with the next synthetic frame, reusing its buffer
    pub fn fill(&mut self, frame: &mut CsiFrame) {
        let n = self.frame_no;
        self.frame_no += 1;

        let burst = self.in_burst(n);
        let base = i16::from(self.config.base_rssi);
        let rssi = match self.config.motion {
            Some(m) if burst => {
                let swing = i16::from(m.swing);
                if n % 2 == 0 {
                    base + swing
                } else {
                    base - swing
                }
            }
            _ => {
                let jitter = i16::from(self.config.rssi_jitter.max(0));
                base + self.rng.random_range(-jitter..=jitter)
            }
        };

        frame.source = if self.rng.random_bool(self.config.foreign_ratio) {
            self.foreign
        } else {
            self.config.peer
        };
        frame.rssi = rssi.clamp(i16::from(i8::MIN), 0) as i8;
        frame.rate = 11;
        frame.noise_floor = -96;
        frame.channel = 6;
        frame.timestamp_us = self.started.elapsed().as_micros() as u32;
        frame.sig_len = 128;
        frame.rx_state = 0;
        frame.first_word_invalid = false;
        let measured = PhyGain {
            agc_gain: jitter_u8(&mut self.rng, self.config.gain.agc_gain),
            fft_gain: jitter_u8(&mut self.rng, self.config.gain.fft_gain),
        };
        let reported = match &self.radio {
            Some(radio) => radio.apply(measured),
            None => measured,
        };
        frame.gain = self.deliver_rx_ctrl(reported);

        let amplitude: i8 = if burst { 40 } else { 12 };
        frame.csi.clear();
        frame
            .csi
            .extend((0..self.config.csi_len).map(|_| self.rng.random_range(-amplitude..=amplitude)));
    }

    /// Pass `gain` through a receive control block the way the driver
    /// delivers it: reserved words carry noise, only the gain bytes are
    /// read back.
    fn deliver_rx_ctrl(&mut self, gain: PhyGain) -> PhyGain {
        let mut record = PhyGainRecord::default();
        self.rng.fill(bytemuck::bytes_of_mut(&mut record));
        record.fft_gain = gain.fft_gain;
        record.agc_gain = gain.agc_gain;

        self.rx_ctrl.copy_from_slice(bytemuck::bytes_of(&record));
        match decode_phy_gain(&self.rx_ctrl) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(error = %e, "rx control block rejected, using measured gain");
                gain
            }
        }
    }

    /// Raw receive control block of the most recent frame
    pub fn last_rx_ctrl(&self) -> &[u8; PhyGainRecord::SIZE] {
        &self.rx_ctrl
    }

    /// Next synthetic frame
    pub fn next_frame(&mut self) -> CsiFrame {
        let mut frame = CsiFrame::default();
        self.fill(&mut frame);
        frame
    }

    /// Frames generated so far
    pub fn generated(&self) -> u64 {
        self.frame_no
    }
}

fn jitter_u8(rng: &mut StdRng, nominal: u8) -> u8 {
    match rng.random_range(0..3u8) {
        0 => nominal.saturating_sub(1),
        1 => nominal,
        _ => nominal.saturating_add(1),
    }
}

/// Mock CSI source
///
/// Implements `CsiSource`, generating frames at the configured rate on a
/// background thread and delivering them through the callback like a real
/// driver would.
pub struct MockCsiSource {
    name: String,
    config: MockCsiConfig,
    radio: SimulatedRadioGain,
    metrics: Arc<IngestionMetrics>,
    listening: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl MockCsiSource {
    /// Create new mock source
    pub fn new(name: impl Into<String>, config: MockCsiConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            config,
            radio: SimulatedRadioGain::new(),
            metrics: Arc::new(IngestionMetrics::new()),
            listening: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        })
    }

    /// Create mock source with default configuration
    pub fn with_defaults(name: impl Into<String>) -> Result<Self> {
        Self::new(name, MockCsiConfig::default())
    }

    /// Gain registers of the simulated radio; hand a clone to the calibrator
    pub fn radio_gain(&self) -> SimulatedRadioGain {
        self.radio.clone()
    }

    pub fn config(&self) -> &MockCsiConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }
}

impl CsiSource for MockCsiSource {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn listen(&self, callback: CsiFrameCallback) {
        // Idempotent: if already listening, don't start again
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let name = self.name.clone();
        let config = self.config.clone();
        let listening = self.listening.clone();
        let metrics = self.metrics.clone();
        let radio = self.radio.clone();
        let interval = Duration::from_secs_f64(1.0 / config.rate_hz);

        let handle = thread::spawn(move || {
            debug!(source = %name, rate_hz = config.rate_hz, "mock CSI source started");

            let mut generator = MockFrameGenerator::new(config).with_radio(radio);
            let mut frame = CsiFrame::default();
            let start_time = Instant::now();

            while listening.load(Ordering::Relaxed) {
                generator.fill(&mut frame);
                callback(&frame);
                metrics.record_received();

                trace!(source = %name, frame = generator.generated(), "mock frame sent");

                let target = pacing_target(interval, generator.generated());
                let elapsed = start_time.elapsed();
                if target > elapsed {
                    thread::sleep(target - elapsed);
                }
            }

            debug!(source = %name, "mock CSI source stopped");
        });

        *self.thread_handle.lock() = Some(handle);
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.lock().take() {
            let _ = handle.join();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::GainControl;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn test_same_seed_same_frames() {
        let mut a = MockFrameGenerator::new(MockCsiConfig::default());
        let mut b = MockFrameGenerator::new(MockCsiConfig::default());

        for _ in 0..300 {
            let (fa, fb) = (a.next_frame(), b.next_frame());
            assert_eq!(fa.rssi, fb.rssi);
            assert_eq!(fa.gain, fb.gain);
            assert_eq!(fa.csi, fb.csi);
        }
    }

    #[test]
    fn test_frame_shape() {
        let mut generator = MockFrameGenerator::new(MockCsiConfig::default());
        let frame = generator.next_frame();

        assert_eq!(frame.csi.len(), 128);
        assert_eq!(frame.source, MockCsiConfig::default().peer);
        assert!((29..=31).contains(&frame.gain.agc_gain));
        assert!((3..=5).contains(&frame.gain.fft_gain));
    }

    #[test]
    fn test_bursts_swing_rssi() {
        let config = MockCsiConfig {
            motion: Some(MotionBursts {
                every_frames: 10,
                burst_frames: 4,
                swing: 20,
            }),
            ..Default::default()
        };
        let mut generator = MockFrameGenerator::new(config);

        let rssi: Vec<i8> = (0..10).map(|_| generator.next_frame().rssi).collect();
        // quiet frames stay within jitter
        assert!(rssi[..6].iter().all(|&r| (-56..=-54).contains(&r)));
        // burst frames alternate base ± swing
        assert_eq!(&rssi[6..], &[-35, -75, -35, -75]);
    }

    #[test]
    fn test_forced_gain_reported_after_override() {
        let radio = SimulatedRadioGain::new();
        let mut generator =
            MockFrameGenerator::new(MockCsiConfig::default()).with_radio(radio.clone());

        let mut control = radio;
        control.force_fft_scale(true, 9);
        control.force_rx_gain(true, 42);

        for _ in 0..20 {
            let gain = generator.next_frame().gain;
            assert_eq!(gain.fft_gain, 9);
            assert_eq!(gain.agc_gain, 42);
        }
    }

    #[test]
    fn test_gain_travels_through_rx_ctrl_block() {
        let mut generator = MockFrameGenerator::new(MockCsiConfig::default());
        for _ in 0..20 {
            let frame = generator.next_frame();
            let raw = generator.last_rx_ctrl();
            assert_eq!(decode_phy_gain(raw).unwrap(), frame.gain);
            assert_eq!(raw[22], frame.gain.fft_gain);
            assert_eq!(raw[23], frame.gain.agc_gain);
        }
        // reserved words are not zero-filled
        assert!(generator.last_rx_ctrl()[..22].iter().any(|&b| b != 0));
    }

    #[test]
    fn test_foreign_ratio_one_stamps_foreign_peer() {
        let config = MockCsiConfig {
            foreign_ratio: 1.0,
            ..Default::default()
        };
        let peer = config.peer;
        let mut generator = MockFrameGenerator::new(config);
        assert_ne!(generator.next_frame().source, peer);
    }

    #[test]
    fn test_rejects_bad_config() {
        let bad_rate = MockCsiConfig {
            rate_hz: 0.0,
            ..Default::default()
        };
        assert!(MockCsiSource::new("mock", bad_rate).is_err());

        let bad_burst = MockCsiConfig {
            motion: Some(MotionBursts {
                every_frames: 5,
                burst_frames: 6,
                swing: 1,
            }),
            ..Default::default()
        };
        assert!(MockCsiSource::new("mock", bad_burst).is_err());
    }

    #[test]
    fn test_mock_source_delivers_until_stopped() {
        let config = MockCsiConfig {
            rate_hz: 1000.0,
            ..Default::default()
        };
        let source = MockCsiSource::new("mock", config).unwrap();
        let count = Arc::new(AtomicU64::new(0));
        let seen = count.clone();

        source.listen(Arc::new(move |frame: &CsiFrame| {
            assert_eq!(frame.csi.len(), 128);
            seen.fetch_add(1, Ordering::Relaxed);
        }));
        assert!(source.is_listening());

        thread::sleep(Duration::from_millis(50));
        source.stop();

        let delivered = count.load(Ordering::Relaxed);
        assert!(delivered > 0);
        assert_eq!(source.metrics().snapshot().frames_received, delivered);
        assert!(!source.is_listening());
    }
}
