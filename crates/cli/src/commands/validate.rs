//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{SensingConfig, TransportConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    expected_peer: String,
    ring_capacity: usize,
    payload_budget: usize,
    transport: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    expected_peer: config.device.expected_peer.to_string(),
                    ring_capacity: config.ring.capacity,
                    payload_budget: config.publish.payload_budget(config.ring.capacity),
                    transport: config.transport.kind().to_string(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &SensingConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.transport == TransportConfig::Log {
        warnings.push("transport is 'log' - payloads only reach the log output".to_string());
    }

    if !config.calibration.enabled {
        warnings.push("calibration disabled - radio gains stay automatic".to_string());
    }

    let budget = config.publish.payload_budget(config.ring.capacity);
    let full = config.ring.capacity.saturating_mul(5).saturating_add(6);
    if budget < full {
        warnings.push(format!(
            "publish.max_payload_bytes ({budget}) may truncate a full ring (worst case {full})"
        ));
    }

    if config.motion.threshold == 0.0 {
        warnings.push("motion.threshold is 0 - any RSSI variance reports motion".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Expected peer: {}", summary.expected_peer);
            println!("  Ring capacity: {}", summary.ring_capacity);
            println!("  Payload budget: {} bytes", summary.payload_budget);
            println!("  Transport: {}", summary.transport);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
