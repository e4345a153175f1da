//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::MacAddress;
use std::net::SocketAddr;
use std::path::PathBuf;

/// csi-sense - Wi-Fi CSI motion sensing pipeline
#[derive(Parser, Debug)]
#[command(
    name = "csi-sense",
    author,
    version,
    about = "Wi-Fi CSI motion sensing pipeline",
    long_about = "Consumes per-packet channel state information from a fixed transmitter,\n\
                  keeps a bounded history of CSI samples and RSSI statistics, decides\n\
                  motion by RSSI variance and periodically publishes the result."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CSI_SENSE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CSI_SENSE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the sensing pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "sensing.toml",
        env = "CSI_SENSE_CONFIG"
    )]
    pub config: PathBuf,

    /// Where CSI frames come from
    #[arg(long, value_enum, default_value = "mock", env = "CSI_SENSE_SOURCE")]
    pub source: SourceKind,

    /// Serial log to replay (required with `--source replay`)
    #[arg(long, required_if_eq("source", "replay"), env = "CSI_SENSE_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Frame delivery rate in Hz (0 = unthrottled, replay only)
    #[arg(long, default_value = "100", env = "CSI_SENSE_RATE_HZ")]
    pub replay_rate_hz: f64,

    /// Loop the replay until stopped
    #[arg(long = "loop")]
    pub loop_playback: bool,

    /// Mock generator seed
    #[arg(long, env = "CSI_SENSE_MOCK_SEED")]
    pub seed: Option<u64>,

    /// Stop after this many seconds (0 = run until Ctrl-C)
    #[arg(long, default_value = "0", env = "CSI_SENSE_DURATION")]
    pub duration_secs: u64,

    /// Override the expected transmitter address
    #[arg(long, env = "CSI_SENSE_PEER")]
    pub peer: Option<MacAddress>,

    /// Override the publish period in milliseconds
    #[arg(long, env = "CSI_SENSE_PERIOD_MS")]
    pub period_ms: Option<u64>,

    /// Publish to this UDP target instead of the configured transport
    #[arg(long, conflicts_with = "output_file", env = "CSI_SENSE_UDP_TARGET")]
    pub udp_target: Option<SocketAddr>,

    /// Append payloads to this file instead of the configured transport
    #[arg(long, env = "CSI_SENSE_OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,

    /// Also print every accepted frame as a CSI_DATA line to this file ('-' for stdout)
    #[arg(long, value_name = "PATH", env = "CSI_SENSE_SERIAL_OUTPUT")]
    pub serial_output: Option<PathBuf>,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CSI_SENSE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "sensing.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "sensing.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Frame source
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SourceKind {
    /// Synthetic frames with periodic motion bursts
    #[default]
    Mock,
    /// Frames replayed from a firmware serial log
    Replay,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_overrides_parse() {
        let cli = Cli::try_parse_from([
            "csi-sense",
            "run",
            "--config",
            "node.toml",
            "--peer",
            "1A-00-00-00-00-01",
            "--period-ms",
            "250",
            "--udp-target",
            "127.0.0.1:5005",
            "--duration-secs",
            "3",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.source, SourceKind::Mock);
        assert_eq!(args.peer.unwrap().to_string(), "1a:00:00:00:00:01");
        assert_eq!(args.period_ms, Some(250));
        assert_eq!(args.udp_target.unwrap().port(), 5005);
        assert_eq!(args.duration_secs, 3);
    }

    #[test]
    fn test_serial_output_flag() {
        let cli = Cli::try_parse_from(["csi-sense", "run", "--serial-output", "-"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.serial_output, Some(PathBuf::from("-")));
    }

    #[test]
    fn test_replay_requires_path() {
        let result = Cli::try_parse_from(["csi-sense", "run", "--source", "replay"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "csi-sense",
            "run",
            "--source",
            "replay",
            "--replay",
            "csi.log",
            "--loop",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.loop_playback);
        assert_eq!(args.replay.unwrap(), PathBuf::from("csi.log"));
    }

    #[test]
    fn test_transport_overrides_conflict() {
        let result = Cli::try_parse_from([
            "csi-sense",
            "run",
            "--udp-target",
            "127.0.0.1:5005",
            "--output-file",
            "out.log",
        ]);
        assert!(result.is_err());
    }
}
