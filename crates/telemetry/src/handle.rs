//! PublisherHandle - runs a publisher on its own periodic task

use std::sync::Arc;
use std::time::Duration;

use contracts::{GainControl, PublishTransport};
use sensing::SensingSnapshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

use crate::metrics::{PublisherMetrics, PublisherMetricsSnapshot};
use crate::publisher::{TelemetryPublisher, TickOutcome};

/// Handle to a running publisher worker
pub struct PublisherHandle {
    /// Transport name
    name: String,
    /// Stop signal for the worker
    shutdown_tx: watch::Sender<bool>,
    /// Shared metrics
    metrics: Arc<PublisherMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl PublisherHandle {
    /// Spawn the worker; the first tick fires one `period` after spawning.
    pub fn spawn<G, T>(publisher: TelemetryPublisher<G, T>, period: Duration) -> Self
    where
        G: GainControl + 'static,
        T: PublishTransport + 'static,
    {
        Self::spawn_with_observer(publisher, period, |_, _| {})
    }

    /// Spawn the worker and call `observer` after every tick.
    ///
    /// The observer runs on the worker task with the state the tick read;
    /// it must stay cheap since it delays the next tick.
    pub fn spawn_with_observer<G, T, F>(
        publisher: TelemetryPublisher<G, T>,
        period: Duration,
        observer: F,
    ) -> Self
    where
        G: GainControl + 'static,
        T: PublishTransport + 'static,
        F: FnMut(&TickOutcome, &SensingSnapshot) + Send + 'static,
    {
        let name = publisher.transport().name().to_string();
        let metrics = Arc::clone(publisher.metrics());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let period = period.max(Duration::from_millis(1));

        let worker_name = name.clone();
        let worker_handle = tokio::spawn(async move {
            publisher_worker(publisher, period, shutdown_rx, observer, worker_name).await;
        });

        Self {
            name,
            shutdown_tx,
            metrics,
            worker_handle,
        }
    }

    /// Get transport name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<PublisherMetrics> {
        &self.metrics
    }

    /// Stop ticking, close the transport and return final counters
    #[instrument(name = "publisher_handle_shutdown", skip(self))]
    pub async fn shutdown(self) -> PublisherMetricsSnapshot {
        // Worker may already be gone; nothing to signal then
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.worker_handle.await {
            error!(transport = %self.name, error = ?e, "Publisher task panicked");
        }
        debug!(transport = %self.name, "PublisherHandle shutdown complete");
        self.metrics.snapshot()
    }
}

/// Worker task that ticks the publisher on a fixed period
#[instrument(
    name = "publisher_worker_loop",
    skip(publisher, shutdown_rx, observer),
    fields(transport = %name)
)]
async fn publisher_worker<G, T, F>(
    mut publisher: TelemetryPublisher<G, T>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
    mut observer: F,
    name: String,
) where
    G: GainControl,
    T: PublishTransport,
    F: FnMut(&TickOutcome, &SensingSnapshot),
{
    info!(transport = %name, period_ms = period.as_millis() as u64, "Publisher started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let outcome = publisher.tick().await;
                observer(&outcome, publisher.last_snapshot());
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    if let Err(e) = publisher.close().await {
        error!(transport = %name, error = %e, "Close failed on shutdown");
    }

    info!(transport = %name, "Publisher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transports::RecordingTransport;
    use contracts::{CsiFrame, MacAddress, SensingConfig};
    use sensing::{FeaturePipeline, NoopGainControl, SharedPipeline};
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::sleep;

    fn shared() -> SharedPipeline<NoopGainControl> {
        SharedPipeline::new(
            FeaturePipeline::new(&SensingConfig::default(), NoopGainControl).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_handle_publishes_periodically() {
        let shared = shared();
        shared.on_packet(
            CsiFrame {
                source: MacAddress::new([0x1a, 0, 0, 0, 0, 0]),
                rssi: -50,
                csi: vec![1, 2, 3],
                ..Default::default()
            }
            .view(),
        );

        let recorder = RecordingTransport::new();
        let publisher =
            TelemetryPublisher::new(shared, recorder.clone(), &SensingConfig::default().publish);
        let handle = PublisherHandle::spawn(publisher, Duration::from_millis(10));

        sleep(Duration::from_millis(100)).await;
        let final_metrics = handle.shutdown().await;

        assert!(final_metrics.published >= 2);
        assert_eq!(final_metrics.published as usize, recorder.len());
        assert!(recorder.is_closed());
        assert!(recorder.messages().iter().all(|m| m.text() == "1,2,3,0,-50"));
    }

    #[tokio::test]
    async fn test_handle_skips_while_ring_empty() {
        let recorder = RecordingTransport::new();
        let publisher =
            TelemetryPublisher::new(shared(), recorder.clone(), &SensingConfig::default().publish);

        let ticks = Arc::new(AtomicU64::new(0));
        let observed = Arc::clone(&ticks);
        let handle = PublisherHandle::spawn_with_observer(
            publisher,
            Duration::from_millis(10),
            move |outcome, snapshot| {
                assert_eq!(*outcome, TickOutcome::Skipped);
                assert!(snapshot.samples.is_empty());
                observed.fetch_add(1, Ordering::Relaxed);
            },
        );

        sleep(Duration::from_millis(60)).await;
        let final_metrics = handle.shutdown().await;

        assert!(recorder.is_empty());
        assert_eq!(final_metrics.published, 0);
        assert_eq!(final_metrics.skipped, ticks.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_shutdown_before_first_tick() {
        let recorder = RecordingTransport::new();
        let publisher =
            TelemetryPublisher::new(shared(), recorder.clone(), &SensingConfig::default().publish);
        let handle = PublisherHandle::spawn(publisher, Duration::from_secs(60));

        let final_metrics = handle.shutdown().await;
        assert_eq!(final_metrics.ticks(), 0);
        assert!(recorder.is_closed());
    }
}
