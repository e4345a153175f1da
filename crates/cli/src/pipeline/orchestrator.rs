//! Pipeline orchestrator - coordinates all components.
//!
//! Start-up order: metrics exporter, link gate, feature pipeline, publisher
//! worker, and only then the source callback. Shutdown runs in reverse.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{CsiFrame, CsiSource, LinkState, PublishTransport, SensingConfig};
use ingestion::{
    IngestionMetrics, LinkGate, MockCsiConfig, MockCsiSource, ReplayConfig, ReplaySource,
    SerialLineWriter, SimulatedRadioGain,
};
use observability::SensingMetricsAggregator;
use parking_lot::Mutex;
use sensing::{FeaturePipeline, PacketOutcome, SensingSnapshot, SharedPipeline};
use telemetry::{transport_from_config, PublisherHandle, TelemetryPublisher, TickOutcome};
use tracing::{info, warn};

use super::RunStats;
use crate::error::{CliError, Result};

/// Where frames come from
#[derive(Debug, Clone)]
pub enum FrameSource {
    /// Synthetic frames
    Mock(MockCsiConfig),
    /// Firmware serial log
    Replay { path: PathBuf, config: ReplayConfig },
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated node configuration
    pub sensing: SensingConfig,

    /// Frame source
    pub source: FrameSource,

    /// Run time limit (None = until shutdown signal or source end)
    pub duration: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Per-frame `CSI_DATA` line output (`-` = stdout)
    pub serial_output: Option<PathBuf>,
}

/// A source ready to be armed, with the handles the orchestrator keeps
struct PreparedSource {
    source: Box<dyn CsiSource>,
    radio: SimulatedRadioGain,
    metrics: Arc<IngestionMetrics>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves, the duration elapses or a finite replay ends
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<RunStats> {
        let start_time = Instant::now();
        let sensing = &self.config.sensing;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)
                .map_err(|e| CliError::metrics(format!("{e:#}")))?;
        }

        // Local sources need no network; the gate opens once they are built
        let gate = LinkGate::new();
        gate.set(LinkState::Connecting);
        let prepared = self.prepare_source()?;
        gate.set(LinkState::Connected);
        gate.wait_connected(Duration::from_millis(sensing.link.connect_timeout_ms))
            .await
            .map_err(CliError::Link)?;

        let serial = match &self.config.serial_output {
            Some(target) => {
                let writer = SerialLineWriter::open(target)?;
                info!(output = writer.name(), "Serial line output enabled");
                Some(Arc::new(writer))
            }
            None => None,
        };

        let pipeline =
            FeaturePipeline::new(sensing, prepared.radio.clone()).map_err(CliError::Config)?;
        let shared = SharedPipeline::new(pipeline);

        let transport = transport_from_config(&sensing.transport).await?;
        let transport_name = transport.name().to_string();
        let publisher = TelemetryPublisher::new(shared.clone(), transport, &sensing.publish);

        info!(
            transport = %transport_name,
            topic = %sensing.publish.topic,
            max_payload = publisher.max_payload(),
            "Publisher configured"
        );

        let aggregator = Arc::new(Mutex::new(SensingMetricsAggregator::new()));
        let observed = Arc::clone(&aggregator);
        let period = Duration::from_millis(sensing.publish.period_ms);
        let handle =
            PublisherHandle::spawn_with_observer(publisher, period, move |outcome, snapshot| {
                observe_tick(&mut observed.lock(), outcome, snapshot);
            });

        let packet_pipeline = shared.clone();
        let source_metrics = Arc::clone(&prepared.metrics);
        let packet_serial = serial.clone();
        prepared.source.listen(Arc::new(move |frame: &CsiFrame| {
            let outcome = packet_pipeline.on_packet(frame.view());
            match outcome {
                PacketOutcome::Accepted { .. } => {
                    if let Some(writer) = &packet_serial {
                        writer.write_frame(frame);
                    }
                }
                _ => source_metrics.record_rejected(),
            }
            observability::record_packet(&outcome);
        }));

        info!(
            source = prepared.source.source_name(),
            peer = %sensing.device.expected_peer,
            "Pipeline running"
        );

        self.wait_for_stop(prepared.source.as_ref(), period, shutdown).await;

        info!("Shutting down pipeline...");
        prepared.source.stop();
        let publisher_metrics = handle.shutdown().await;

        let serial_lines = serial.map(|writer| {
            if let Err(e) = writer.flush() {
                warn!(output = writer.name(), error = %e, "Serial output flush failed");
            }
            writer.lines_written()
        });

        let (counters, calibration) =
            shared.with(|pipeline| (pipeline.counters(), pipeline.calibrator().force()));
        let sensing_metrics = aggregator.lock().clone();

        let stats = RunStats {
            source: prepared.source.source_name().to_string(),
            transport: transport_name,
            duration: start_time.elapsed(),
            ingestion: prepared.metrics.snapshot(),
            publisher: publisher_metrics,
            counters,
            calibration,
            sensing: sensing_metrics,
            serial_lines,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            frame_rate = format!("{:.2}", stats.frame_rate()),
            published = stats.publisher.published,
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }

    fn prepare_source(&self) -> Result<PreparedSource> {
        match &self.config.source {
            FrameSource::Mock(config) => {
                info!(peer = %config.peer, rate_hz = config.rate_hz, "Running in MOCK mode");
                let source = MockCsiSource::new("mock", config.clone())?;
                Ok(PreparedSource {
                    radio: source.radio_gain(),
                    metrics: Arc::clone(source.metrics()),
                    source: Box::new(source),
                })
            }
            FrameSource::Replay { path, config } => {
                info!(path = %path.display(), "Running in REPLAY mode");
                let source = ReplaySource::load(path, config.clone())?;
                Ok(PreparedSource {
                    // Replayed gains are historical; overrides are recorded only
                    radio: SimulatedRadioGain::new(),
                    metrics: Arc::clone(source.metrics()),
                    source: Box::new(source),
                })
            }
        }
    }

    async fn wait_for_stop(
        &self,
        source: &dyn CsiSource,
        period: Duration,
        shutdown: impl Future<Output = ()>,
    ) {
        let deadline = async {
            match self.config.duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };

        let source_finished = async {
            let mut poll = tokio::time::interval(Duration::from_millis(50));
            while source.is_listening() {
                poll.tick().await;
            }
            // Let the last state go out before tearing down
            tokio::time::sleep(period.saturating_mul(2)).await;
        };

        tokio::select! {
            _ = shutdown => warn!("Received shutdown signal, stopping pipeline..."),
            _ = deadline => info!("Run duration reached"),
            _ = source_finished => info!(source = source.source_name(), "Source finished"),
        }
    }
}

/// Feed one publisher tick into Prometheus and the run aggregator
fn observe_tick(
    aggregator: &mut SensingMetricsAggregator,
    outcome: &TickOutcome,
    snapshot: &SensingSnapshot,
) {
    let (success, bytes, truncated) = match *outcome {
        TickOutcome::Skipped => {
            observability::record_publish_skipped();
            aggregator.observe_skipped();
            return;
        }
        TickOutcome::Published {
            bytes, truncated, ..
        } => (true, bytes, truncated),
        TickOutcome::Failed => (false, 0, false),
    };

    observability::record_publish(success, bytes, truncated);
    observability::record_motion(&snapshot.motion);
    observability::record_ring_depth(snapshot.samples.len());
    observability::record_pipeline_counters(&snapshot.counters);
    aggregator.observe_publish(snapshot, success, bytes, truncated);
}
