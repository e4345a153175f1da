//! Ingestion 错误类型

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 回放文件无法读取
    #[error("failed to read replay file {path}: {source}")]
    ReplayRead {
        /// 文件路径
        path: PathBuf,
        /// 底层 IO 错误
        #[source]
        source: std::io::Error,
    },

    /// 串口行输出目标无法创建
    #[error("failed to open serial output {path}: {source}")]
    SerialOutput {
        /// 输出路径
        path: PathBuf,
        /// 底层 IO 错误
        #[source]
        source: std::io::Error,
    },

    /// 回放文件中没有可用的 CSI 记录
    #[error("no CSI records in {name} ({parse_errors} unparsable lines)")]
    EmptyReplay {
        /// 数据源名称
        name: String,
        /// 解析失败的行数
        parse_errors: u64,
    },

    /// 数据源配置无效
    #[error("invalid source config '{field}': {message}")]
    InvalidConfig {
        /// 字段名
        field: &'static str,
        /// 错误消息
        message: String,
    },

    /// 契约层错误
    #[error(transparent)]
    Contract(#[from] contracts::ContractError),
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
