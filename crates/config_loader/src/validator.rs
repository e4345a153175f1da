//! 配置校验模块
//!
//! 校验规则：
//! - 0 < ring.evict_block < ring.capacity
//! - rssi.window > 0 且 1 <= rssi.quorum <= rssi.window
//! - motion.threshold 有限且 >= 0
//! - 1 <= calibration.packets <= MAX_PACKETS
//! - publish.period_ms > 0，topic 非空，max_payload_bytes >= MIN_PAYLOAD_BYTES
//! - link.connect_timeout_ms > 0
//! - transport 必填字段齐全

use contracts::{CalibrationConfig, ContractError, PublishConfig, SensingConfig, TransportConfig};

/// 校验 SensingConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &SensingConfig) -> Result<(), ContractError> {
    validate_ring(config)?;
    validate_rssi(config)?;
    validate_motion(config)?;
    validate_calibration(config)?;
    validate_publish(config)?;
    validate_link(config)?;
    validate_transport(config)?;
    Ok(())
}

/// 校验样本环形缓冲区
fn validate_ring(config: &SensingConfig) -> Result<(), ContractError> {
    let ring = &config.ring;

    if ring.capacity == 0 {
        return Err(ContractError::config_validation(
            "ring.capacity",
            "capacity must be > 0",
        ));
    }
    if ring.evict_block == 0 || ring.evict_block >= ring.capacity {
        return Err(ContractError::config_validation(
            "ring.evict_block",
            format!(
                "evict_block ({}) must be > 0 and < capacity ({})",
                ring.evict_block, ring.capacity
            ),
        ));
    }
    Ok(())
}

/// 校验 RSSI 窗口
fn validate_rssi(config: &SensingConfig) -> Result<(), ContractError> {
    let rssi = &config.rssi;

    if rssi.window == 0 {
        return Err(ContractError::config_validation(
            "rssi.window",
            "window must be > 0",
        ));
    }
    if rssi.quorum == 0 || rssi.quorum > rssi.window {
        return Err(ContractError::config_validation(
            "rssi.quorum",
            format!(
                "quorum ({}) must be in 1..={} (window)",
                rssi.quorum, rssi.window
            ),
        ));
    }
    Ok(())
}

/// 校验运动阈值
fn validate_motion(config: &SensingConfig) -> Result<(), ContractError> {
    let threshold = config.motion.threshold;

    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ContractError::config_validation(
            "motion.threshold",
            format!("threshold must be finite and >= 0, got {threshold}"),
        ));
    }
    Ok(())
}

/// 校验增益校准
fn validate_calibration(config: &SensingConfig) -> Result<(), ContractError> {
    let packets = config.calibration.packets;

    if packets == 0 || packets > CalibrationConfig::MAX_PACKETS {
        return Err(ContractError::config_validation(
            "calibration.packets",
            format!(
                "packets ({packets}) must be in 1..={}",
                CalibrationConfig::MAX_PACKETS
            ),
        ));
    }
    Ok(())
}

/// 校验发布策略
fn validate_publish(config: &SensingConfig) -> Result<(), ContractError> {
    let publish = &config.publish;

    if publish.period_ms == 0 {
        return Err(ContractError::config_validation(
            "publish.period_ms",
            "period_ms must be > 0",
        ));
    }
    if publish.topic.trim().is_empty() {
        return Err(ContractError::config_validation(
            "publish.topic",
            "topic cannot be empty",
        ));
    }
    if let Some(bytes) = publish.max_payload_bytes {
        if bytes < PublishConfig::MIN_PAYLOAD_BYTES {
            return Err(ContractError::config_validation(
                "publish.max_payload_bytes",
                format!(
                    "max_payload_bytes ({bytes}) must be >= {} to carry a sample plus motion and rssi",
                    PublishConfig::MIN_PAYLOAD_BYTES
                ),
            ));
        }
    }
    Ok(())
}

/// 校验连接等待
fn validate_link(config: &SensingConfig) -> Result<(), ContractError> {
    if config.link.connect_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "link.connect_timeout_ms",
            "connect_timeout_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验传输配置
fn validate_transport(config: &SensingConfig) -> Result<(), ContractError> {
    match &config.transport {
        TransportConfig::File { path } if path.as_os_str().is_empty() => Err(
            ContractError::config_validation("transport.path", "file path cannot be empty"),
        ),
        TransportConfig::Udp { addr } if addr.port() == 0 => Err(
            ContractError::config_validation("transport.addr", "udp target port cannot be 0"),
        ),
        _ => Ok(()),
    }
}
