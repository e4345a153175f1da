//! # Telemetry
//!
//! 周期性遥测发布模块。
//!
//! 负责：
//! - 在固定周期读取 `SharedPipeline` 快照
//! - 编码为 `v0,...,vN,<motion>,<rssi>` 文本负载
//! - 交给 `PublishTransport`，失败不重试、不回压采集链路

pub mod encoder;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod publisher;
pub mod transports;

pub use contracts::{DeliveryQuality, MessageId, PublishRequest, PublishTransport};
pub use encoder::{encode_payload, EncodeOutcome};
pub use error::TelemetryError;
pub use handle::PublisherHandle;
pub use metrics::{PublisherMetrics, PublisherMetricsSnapshot};
pub use publisher::{TelemetryPublisher, TickOutcome};
pub use transports::{
    transport_from_config, AnyTransport, FileTransport, LogTransport, PublishedMessage,
    RecordingTransport, UdpTransport,
};
