//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{SensingConfig, TransportConfig};
use ingestion::{MockCsiConfig, ReplayConfig};
use std::time::Duration;
use tracing::info;

use crate::cli::{RunArgs, SourceKind};
use crate::error::CliError;
use crate::pipeline::{FrameSource, Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut config, args);

    // Overrides must satisfy the same rules as the file
    config_loader::validate(&config)
        .map_err(CliError::Config)
        .context("Command-line overrides produced an invalid configuration")?;

    info!(
        peer = %config.device.expected_peer,
        capacity = config.ring.capacity,
        period_ms = config.publish.period_ms,
        transport = config.transport.kind(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        source: frame_source(args, &config),
        sensing: config,
        duration: (args.duration_secs > 0).then(|| Duration::from_secs(args.duration_secs)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
        serial_output: args.serial_output.clone(),
    };

    info!("Starting pipeline...");

    let stats = Pipeline::new(pipeline_config)
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        frames = stats.ingestion.frames_received,
        published = stats.publisher.published,
        failed = stats.publisher.failed,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("csi-sense finished");
    Ok(())
}

/// Apply command-line overrides on top of the loaded file
fn apply_overrides(config: &mut SensingConfig, args: &RunArgs) {
    if let Some(peer) = args.peer {
        info!(peer = %peer, "Overriding expected peer from CLI");
        config.device.expected_peer = peer;
    }
    if let Some(period_ms) = args.period_ms {
        info!(period_ms, "Overriding publish period from CLI");
        config.publish.period_ms = period_ms;
    }
    if let Some(addr) = args.udp_target {
        info!(%addr, "Overriding transport with UDP target from CLI");
        config.transport = TransportConfig::Udp { addr };
    }
    if let Some(ref path) = args.output_file {
        info!(path = %path.display(), "Overriding transport with output file from CLI");
        config.transport = TransportConfig::File { path: path.clone() };
    }
}

fn frame_source(args: &RunArgs, config: &SensingConfig) -> FrameSource {
    match (args.source, &args.replay) {
        (SourceKind::Replay, Some(path)) => FrameSource::Replay {
            path: path.clone(),
            config: ReplayConfig {
                rate_hz: args.replay_rate_hz,
                loop_playback: args.loop_playback,
            },
        },
        // clap enforces --replay for the replay source
        _ => FrameSource::Mock(MockCsiConfig {
            peer: config.device.expected_peer,
            rate_hz: args.replay_rate_hz,
            seed: args.seed.unwrap_or(MockCsiConfig::default().seed),
            ..Default::default()
        }),
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &SensingConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Device:");
    println!("  Expected peer: {}", config.device.expected_peer);
    println!("\nRing:");
    println!(
        "  Capacity: {} (evict block {})",
        config.ring.capacity, config.ring.evict_block
    );
    println!("\nMotion:");
    println!(
        "  RSSI window: {} (quorum {})",
        config.rssi.window, config.rssi.quorum
    );
    println!("  Variance threshold: {}", config.motion.threshold);
    println!("\nCalibration:");
    if config.calibration.enabled {
        println!("  Lock after {} packets", config.calibration.packets);
    } else {
        println!("  Disabled");
    }
    println!("\nPublish:");
    println!("  Topic: {}", config.publish.topic);
    println!("  Period: {} ms", config.publish.period_ms);
    println!(
        "  Payload budget: {} bytes",
        config.publish.payload_budget(config.ring.capacity)
    );
    println!("  Transport: {}", config.transport.kind());
    println!();
}
