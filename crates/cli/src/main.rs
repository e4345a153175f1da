//! # csi-sense CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 感知管道编排与生命周期管理
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // .env 可选
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "csi-sense starting");

    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    result.inspect_err(|e| tracing::error!(error = %e, "command failed"))
}

/// 日志级别：`-q` 压到 warn，`-v`/`-vv` 逐级放宽；RUST_LOG 始终优先
fn log_level(cli: &Cli) -> &'static str {
    match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

/// 仅初始化 tracing；Prometheus 端点由 `run` 按 `--metrics-port` 决定是否开启
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_tracing(cli.log_format.into(), log_level(cli))
}
