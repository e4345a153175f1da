//! Run statistics.

use std::time::Duration;

use contracts::GainForce;
use ingestion::MetricsSnapshot;
use observability::SensingMetricsAggregator;
use sensing::PipelineCounters;
use telemetry::PublisherMetricsSnapshot;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Source name
    pub source: String,

    /// Transport kind
    pub transport: String,

    /// Total duration of the run
    pub duration: Duration,

    /// Source-side counters
    pub ingestion: MetricsSnapshot,

    /// Publisher counters
    pub publisher: PublisherMetricsSnapshot,

    /// Final pipeline counters
    pub counters: PipelineCounters,

    /// Gains forced at calibration lock, if it happened
    pub calibration: Option<GainForce>,

    /// Per-tick aggregation
    pub sensing: SensingMetricsAggregator,

    /// Serial lines written, when serial output was enabled
    pub serial_lines: Option<u64>,
}

impl RunStats {
    /// Frames delivered per second
    pub fn frame_rate(&self) -> f64 {
        per_second(self.ingestion.frames_received, self.duration)
    }

    /// Successful publishes per second
    pub fn publish_rate(&self) -> f64 {
        per_second(self.publisher.published, self.duration)
    }

    /// Share of delivered frames the pipeline refused, as a percentage
    pub fn reject_rate(&self) -> f64 {
        if self.ingestion.frames_received > 0 {
            self.ingestion.frames_rejected as f64 / self.ingestion.frames_received as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Sensing Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Source: {}", self.source);
        println!("   ├─ Transport: {}", self.transport);
        println!(
            "   ├─ Frames received: {} ({:.2}/s)",
            self.ingestion.frames_received,
            self.frame_rate()
        );
        println!(
            "   ├─ Frames rejected: {} ({:.2}%)",
            self.ingestion.frames_rejected,
            self.reject_rate()
        );
        println!("   └─ Parse errors: {}", self.ingestion.parse_errors);

        if let Some(lines) = self.serial_lines {
            println!("\nSerial output: {lines} CSI_DATA lines");
        }

        println!("\nPipeline");
        println!("   ├─ Accepted: {}", self.counters.accepted);
        println!("   ├─ Foreign peer: {}", self.counters.rejected_peer);
        println!("   ├─ Empty payload: {}", self.counters.empty_payload);
        println!("   ├─ Ring evictions: {}", self.counters.evictions);
        println!("   └─ Truncated values: {}", self.counters.truncated);

        println!("\nPublisher");
        println!(
            "   ├─ Published: {} ({:.2}/s, {} bytes)",
            self.publisher.published,
            self.publish_rate(),
            self.publisher.bytes
        );
        println!("   ├─ Truncated: {}", self.publisher.truncated);
        println!("   ├─ Skipped: {}", self.publisher.skipped);
        println!("   └─ Failed: {}", self.publisher.failed);

        let summary = self.sensing.summary();

        println!("\nMotion");
        println!("   ├─ Motion ticks: {:.2}%", summary.motion_rate);
        println!("   ├─ Transitions: {}", summary.motion_transitions);
        println!("   ├─ RSSI variance: {}", summary.rssi_variance);
        println!("   └─ Payload bytes: {}", summary.payload_bytes);

        match self.calibration {
            Some(force) => println!(
                "\nCalibration locked: fft_force={}, agc_force={}",
                force.fft_force, force.agc_force
            ),
            None => println!("\nCalibration: not locked"),
        }

        println!();
    }
}

fn per_second(count: u64, duration: Duration) -> f64 {
    if duration.as_secs_f64() > 0.0 {
        count as f64 / duration.as_secs_f64()
    } else {
        0.0
    }
}
