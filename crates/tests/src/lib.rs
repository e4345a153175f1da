//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需射频硬件）
//! - 回放日志到发布负载的完整链路

#[cfg(test)]
mod contract_tests {
    use contracts::{ConfigVersion, DeliveryQuality, SensingConfig};

    #[test]
    fn test_contracts_compile() {
        let _ = ConfigVersion::V1;
        let _ = DeliveryQuality::AtLeastOnce;
    }

    #[test]
    fn test_default_config_passes_validation() {
        assert!(config_loader::validate(&SensingConfig::default()).is_ok());
    }
}

#[cfg(test)]
mod support {
    use contracts::{CsiFrame, MacAddress, SensingConfig};
    use ingestion::SimulatedRadioGain;
    use sensing::{FeaturePipeline, SharedPipeline};
    use telemetry::{RecordingTransport, TelemetryPublisher};

    pub const PEER: MacAddress = MacAddress::new([0x1a, 0, 0, 0, 0, 0]);

    pub fn small_config() -> SensingConfig {
        let mut config = SensingConfig::default();
        config.ring.capacity = 64;
        config.ring.evict_block = 8;
        config.rssi.window = 8;
        config.rssi.quorum = 3;
        config.calibration.packets = 4;
        config.publish.period_ms = 20;
        config
    }

    pub fn frame(source: MacAddress, rssi: i8, csi: &[i8]) -> CsiFrame {
        CsiFrame {
            source,
            rssi,
            csi: csi.to_vec(),
            ..Default::default()
        }
    }

    pub fn publisher_for(
        config: &SensingConfig,
    ) -> (
        SharedPipeline<SimulatedRadioGain>,
        RecordingTransport,
        TelemetryPublisher<SimulatedRadioGain, RecordingTransport>,
    ) {
        let pipeline = FeaturePipeline::new(config, SimulatedRadioGain::new()).unwrap();
        let shared = SharedPipeline::new(pipeline);
        let transport = RecordingTransport::new();
        let publisher = TelemetryPublisher::new(shared.clone(), transport.clone(), &config.publish);
        (shared, transport, publisher)
    }

    /// Split a payload into (samples, motion flag, rssi)
    pub fn parse_payload(payload: &str) -> (Vec<i16>, u8, i16) {
        let fields: Vec<&str> = payload.split(',').collect();
        assert!(fields.len() >= 3, "payload too short: {payload}");
        let (samples, trailer) = fields.split_at(fields.len() - 2);
        (
            samples.iter().map(|v| v.parse().unwrap()).collect(),
            trailer[0].parse().unwrap(),
            trailer[1].parse().unwrap(),
        )
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::{Cursor, Write};
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{CsiFrame, CsiSource, DeliveryQuality, GainControl, MacAddress, PhyGain};
    use ingestion::{
        format_csi_line, MockCsiConfig, MockCsiSource, MockFrameGenerator, MotionBursts,
        ReplayConfig, ReplaySource,
    };
    use sensing::{FeaturePipeline, PacketOutcome, SharedPipeline};
    use telemetry::{PublisherHandle, RecordingTransport, TelemetryPublisher, TickOutcome};

    use crate::support::{frame, parse_payload, publisher_for, small_config, PEER};

    /// A tick that fires before any packet publishes nothing and leaves the ring untouched.
    #[tokio::test]
    async fn test_tick_before_first_packet_is_noop() {
        let config = small_config();
        let (shared, transport, mut publisher) = publisher_for(&config);

        assert_eq!(publisher.tick().await, TickOutcome::Skipped);
        assert!(transport.is_empty());
        assert!(shared.is_empty());

        shared.on_packet(frame(PEER, -50, &[1, 2]).view());
        assert!(matches!(
            publisher.tick().await,
            TickOutcome::Published { .. }
        ));
        assert_eq!(transport.messages()[0].text(), "1,2,0,-50");
    }

    /// Foreign frames leave no trace in the published payload.
    #[tokio::test]
    async fn test_foreign_peer_never_reaches_payload() {
        let config = small_config();
        let (shared, transport, mut publisher) = publisher_for(&config);
        let stranger = MacAddress::new([0x02, 0, 0, 0, 0, 0x99]);

        assert_eq!(
            shared.on_packet(frame(stranger, -20, &[99, 99]).view()),
            PacketOutcome::RejectedPeer
        );
        assert_eq!(publisher.tick().await, TickOutcome::Skipped);

        shared.on_packet(frame(PEER, -61, &[3, -4]).view());
        shared.on_packet(frame(stranger, -20, &[99]).view());
        publisher.tick().await;

        let (samples, _, rssi) = parse_payload(&transport.messages()[0].text());
        assert_eq!(samples, vec![3, -4]);
        assert_eq!(rssi, -61);
    }

    /// A failed publish is not retried and does not clear the ring.
    #[tokio::test]
    async fn test_publish_failure_keeps_state() {
        let config = small_config();
        let (shared, transport, mut publisher) = publisher_for(&config);
        shared.on_packet(frame(PEER, -40, &[5, 6, 7]).view());

        transport.set_failing(true);
        assert_eq!(publisher.tick().await, TickOutcome::Failed);
        assert!(transport.is_empty());

        transport.set_failing(false);
        assert!(matches!(
            publisher.tick().await,
            TickOutcome::Published { .. }
        ));
        assert_eq!(transport.len(), 1);
        assert_eq!(transport.messages()[0].text(), "5,6,7,0,-40");

        let metrics = publisher.metrics().snapshot();
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.published, 1);
    }

    /// A tight payload budget yields a field-aligned prefix within budget.
    #[tokio::test]
    async fn test_truncated_payload_is_field_aligned() {
        let mut config = small_config();
        config.publish.max_payload_bytes = Some(20);
        let (shared, transport, mut publisher) = publisher_for(&config);

        shared.on_packet(frame(PEER, -70, &[-100, -101, -102, -103, -104, -105, -106]).view());

        let TickOutcome::Published {
            bytes, truncated, ..
        } = publisher.tick().await
        else {
            panic!("expected publish");
        };
        assert!(truncated);
        assert!(bytes <= 20);

        let text = transport.messages()[0].text();
        assert_eq!(text, "-100,-101,-102,0,-70");

        let (samples, motion, rssi) = parse_payload(&text);
        assert_eq!(samples, vec![-100, -101, -102]);
        assert_eq!(motion, 0);
        assert_eq!(rssi, -70);
    }

    /// Ring eviction through the full pipeline keeps the newest values in order.
    #[tokio::test]
    async fn test_eviction_visible_in_payload() {
        let config = small_config();
        let (shared, transport, mut publisher) = publisher_for(&config);

        // 70 values into a 64-slot ring with 8-value eviction blocks
        for i in 0..70i16 {
            shared.on_packet(frame(PEER, -50, &[(i % 100) as i8]).view());
        }
        publisher.tick().await;

        let (samples, _, _) = parse_payload(&transport.messages()[0].text());
        let expected: Vec<i16> = (8..70).collect();
        assert_eq!(samples, expected);
        assert_eq!(publisher.last_snapshot().counters.evictions, 1);
    }

    /// Motion bursts from the mock generator flip the published flag on and off.
    #[tokio::test]
    async fn test_motion_flag_follows_bursts() {
        let config = small_config();
        let (shared, transport, mut publisher) = publisher_for(&config);

        let mut generator = MockFrameGenerator::new(MockCsiConfig {
            csi_len: 4,
            rssi_jitter: 0,
            motion: Some(MotionBursts {
                every_frames: 40,
                burst_frames: 10,
                swing: 10,
            }),
            ..Default::default()
        });
        let mut frame = CsiFrame::default();
        let mut flags = Vec::new();

        // frames 0..30 quiet, 30..40 burst, 40..70 quiet
        for n in 0..70u64 {
            generator.fill(&mut frame);
            shared.on_packet(frame.view());
            if n == 29 || n == 39 || n == 69 {
                publisher.tick().await;
                let (_, motion, _) = parse_payload(&transport.messages().last().unwrap().text());
                flags.push(motion);
            }
        }

        assert_eq!(flags, vec![0, 1, 0]);
    }

    /// Calibration locks through a live mock source and the radio reports forced gains.
    #[tokio::test]
    async fn test_calibration_locks_mock_radio() {
        let config = small_config();
        let source = MockCsiSource::new(
            "mock",
            MockCsiConfig {
                rate_hz: 1000.0,
                csi_len: 8,
                gain: PhyGain {
                    agc_gain: 40,
                    fft_gain: 6,
                },
                ..Default::default()
            },
        )
        .unwrap();
        let radio = source.radio_gain();

        let shared = SharedPipeline::new(FeaturePipeline::new(&config, radio.clone()).unwrap());
        let producer = shared.clone();
        source.listen(Arc::new(move |frame: &CsiFrame| {
            producer.on_packet(frame.view());
        }));
        tokio::time::sleep(Duration::from_millis(100)).await;
        source.stop();

        let force = shared
            .with(|pipeline| pipeline.calibrator().force())
            .expect("calibration should lock within 100 ms at 1 kHz");
        assert!((39..=41).contains(&force.agc_force));
        assert!((5..=7).contains(&force.fft_force));
        assert_eq!(radio.forced_agc(), Some(force.agc_force));
        assert_eq!(radio.forced_fft(), Some(force.fft_force));
    }

    /// Mock source -> pipeline -> periodic publisher -> recording transport.
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let config = small_config();
        let source = MockCsiSource::new(
            "mock",
            MockCsiConfig {
                rate_hz: 500.0,
                csi_len: 16,
                foreign_ratio: 0.2,
                ..Default::default()
            },
        )
        .unwrap();

        let shared =
            SharedPipeline::new(FeaturePipeline::new(&config, source.radio_gain()).unwrap());
        let transport = RecordingTransport::new();
        let publisher = TelemetryPublisher::new(shared.clone(), transport.clone(), &config.publish);
        let handle = PublisherHandle::spawn(publisher, Duration::from_millis(20));

        let producer = shared.clone();
        source.listen(Arc::new(move |frame: &CsiFrame| {
            producer.on_packet(frame.view());
        }));

        tokio::time::sleep(Duration::from_millis(300)).await;
        source.stop();
        let metrics = handle.shutdown().await;

        assert!(metrics.published > 0);
        assert_eq!(metrics.failed, 0);
        assert!(transport.is_closed());

        let counters = shared.with(|pipeline| pipeline.counters());
        assert!(counters.accepted > 0);
        assert!(counters.rejected_peer > 0);

        for message in transport.messages() {
            assert_eq!(message.topic, "csi/data");
            assert_eq!(message.quality, DeliveryQuality::AtLeastOnce);
            assert!(!message.retain);

            let (samples, motion, rssi) = parse_payload(&message.text());
            assert!(!samples.is_empty() && samples.len() <= config.ring.capacity);
            assert!(motion <= 1);
            assert!(rssi < 0);
            assert!(message.payload.len() <= config.publish.payload_budget(64));
        }
    }

    /// Serial log replay -> pipeline, with interleaved noise and a foreign transmitter.
    #[tokio::test]
    async fn test_replay_log_to_payload() {
        let config = small_config();
        let stranger = MacAddress::new([0x02, 0, 0, 0, 0, 0x01]);

        let mut log = Vec::new();
        writeln!(log, "I (312) wifi: connected").unwrap();
        for i in 0..10u64 {
            let source = if i % 5 == 4 { stranger } else { PEER };
            let frame = frame(source, -45 - i as i8, &[i as i8, -(i as i8)]);
            writeln!(log, "{}", format_csi_line(i, &frame)).unwrap();
        }
        writeln!(log, "CSI_DATA,12,1a:00:00:00:00:00,-50,11,6").unwrap();

        let replay = ReplaySource::from_reader(
            "log",
            Cursor::new(log),
            ReplayConfig {
                rate_hz: 0.0,
                loop_playback: false,
            },
        )
        .unwrap();
        assert_eq!(replay.len(), 10);
        assert_eq!(replay.metrics().snapshot().parse_errors, 1);

        let (shared, transport, mut publisher) = publisher_for(&config);
        let producer = shared.clone();
        replay.listen(Arc::new(move |frame: &CsiFrame| {
            producer.on_packet(frame.view());
        }));
        replay.join();

        let counters = shared.with(|pipeline| pipeline.counters());
        assert_eq!(counters.accepted, 8);
        assert_eq!(counters.rejected_peer, 2);

        publisher.tick().await;
        let (samples, _, rssi) = parse_payload(&transport.messages()[0].text());
        let expected: Vec<i16> = [0, 1, 2, 3, 5, 6, 7, 8]
            .iter()
            .flat_map(|&i| [i, -i])
            .collect();
        assert_eq!(samples, expected);
        assert_eq!(rssi, -53);
    }

    /// Config file -> validated config -> publisher sized from the ring.
    #[tokio::test]
    async fn test_config_file_drives_publisher() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[device]
expected_peer = "1A:00:00:00:00:02"

[ring]
capacity = 32
evict_block = 4

[publish]
topic = "lab/csi"
retain = true
"#
        )
        .unwrap();

        let config = config_loader::ConfigLoader::load_from_path(file.path()).unwrap();
        let (shared, transport, mut publisher) = publisher_for(&config);
        assert_eq!(publisher.max_payload(), 32 * 4 + 6);

        let peer = config.device.expected_peer;
        shared.on_packet(frame(peer, -48, &[1]).view());
        publisher.tick().await;

        let message = &transport.messages()[0];
        assert_eq!(message.topic, "lab/csi");
        assert!(message.retain);
    }

    /// Forcing gains on the simulated radio is visible to later frames.
    #[test]
    fn test_simulated_radio_feeds_generator() {
        let source = MockCsiSource::with_defaults("mock").unwrap();
        let mut control = source.radio_gain();
        control.force_fft_scale(true, 2);
        control.force_rx_gain(true, 3);

        let mut generator = MockFrameGenerator::new(MockCsiConfig::default())
            .with_radio(source.radio_gain());
        let frame = generator.next_frame();
        assert_eq!(
            frame.gain,
            PhyGain {
                agc_gain: 3,
                fft_gain: 2
            }
        );
    }

    #[test]
    fn test_aggregator_from_pipeline_snapshot() {
        let config = small_config();
        let (shared, _, _) = publisher_for(&config);
        shared.on_packet(frame(PEER, -50, &[1, 2, 3]).view());

        let mut snapshot = shared.empty_snapshot();
        assert!(shared.snapshot_into(&mut snapshot));

        let mut aggregator = observability::SensingMetricsAggregator::new();
        aggregator.observe_publish(&snapshot, true, 12, false);
        let summary = aggregator.summary();
        assert_eq!(summary.published, 1);
        assert_eq!(summary.counters.accepted, 1);
        assert!(summary.to_string().contains("Calibration: pending"));
    }
}
