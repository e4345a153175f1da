//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{SensingConfig, TransportConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    expected_peer: String,
    ring: RingInfo,
    motion: MotionInfo,
    calibration: CalibrationInfo,
    publish: PublishInfo,
    transport: TransportInfo,
}

#[derive(Serialize)]
struct RingInfo {
    capacity: usize,
    evict_block: usize,
    retained_after_eviction: usize,
}

#[derive(Serialize)]
struct MotionInfo {
    rssi_window: usize,
    rssi_quorum: usize,
    variance_threshold: f32,
}

#[derive(Serialize)]
struct CalibrationInfo {
    enabled: bool,
    packets: u32,
}

#[derive(Serialize)]
struct PublishInfo {
    topic: String,
    period_ms: u64,
    retain: bool,
    payload_budget: usize,
    link_timeout_ms: u64,
}

#[derive(Serialize)]
struct TransportInfo {
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &SensingConfig) -> ConfigInfo {
    let target = match &config.transport {
        TransportConfig::Log => None,
        TransportConfig::Udp { addr } => Some(addr.to_string()),
        TransportConfig::File { path } => Some(path.display().to_string()),
    };

    ConfigInfo {
        version: format!("{:?}", config.version),
        expected_peer: config.device.expected_peer.to_string(),
        ring: RingInfo {
            capacity: config.ring.capacity,
            evict_block: config.ring.evict_block,
            retained_after_eviction: config.ring.retain_size(),
        },
        motion: MotionInfo {
            rssi_window: config.rssi.window,
            rssi_quorum: config.rssi.quorum,
            variance_threshold: config.motion.threshold,
        },
        calibration: CalibrationInfo {
            enabled: config.calibration.enabled,
            packets: config.calibration.packets,
        },
        publish: PublishInfo {
            topic: config.publish.topic.clone(),
            period_ms: config.publish.period_ms,
            retain: config.publish.retain,
            payload_budget: config.publish.payload_budget(config.ring.capacity),
            link_timeout_ms: config.link.connect_timeout_ms,
        },
        transport: TransportInfo {
            kind: config.transport.kind().to_string(),
            target,
        },
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== csi-sense Configuration ===\n");
    println!("Version: {}", info.version);
    println!("Expected peer: {}", info.expected_peer);

    println!("\nSample ring:");
    println!("  Capacity: {}", info.ring.capacity);
    println!(
        "  Evict block: {} (keeps {})",
        info.ring.evict_block, info.ring.retained_after_eviction
    );

    println!("\nMotion detection:");
    println!(
        "  RSSI window: {} (quorum {})",
        info.motion.rssi_window, info.motion.rssi_quorum
    );
    println!("  Variance threshold: {}", info.motion.variance_threshold);

    println!("\nGain calibration:");
    if info.calibration.enabled {
        println!("  Lock after {} packets", info.calibration.packets);
    } else {
        println!("  Disabled");
    }

    println!("\nPublish:");
    println!("  Topic: {}", info.publish.topic);
    println!("  Period: {} ms", info.publish.period_ms);
    println!("  Retain: {}", info.publish.retain);
    println!("  Payload budget: {} bytes", info.publish.payload_budget);
    println!("  Link timeout: {} ms", info.publish.link_timeout_ms);

    match &info.transport.target {
        Some(target) => println!("\nTransport: {} -> {}", info.transport.kind, target),
        None => println!("\nTransport: {}", info.transport.kind),
    }
    println!();
}
