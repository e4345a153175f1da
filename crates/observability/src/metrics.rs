//! 感知管道指标收集模块
//!
//! 记录逐包结果、发布结果、运动判定与增益校准，并在内存中聚合摘要。

use contracts::{GainForce, MotionState};
use metrics::{counter, gauge, histogram};
use sensing::{PacketOutcome, PipelineCounters, SensingSnapshot};

/// 记录单个数据包的处理结果
///
/// 在驱动回调里调用，只做计数器自增。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_packet;
///
/// let outcome = shared.on_packet(frame.view());
/// record_packet(&outcome);
/// ```
pub fn record_packet(outcome: &PacketOutcome) {
    let status = match outcome {
        PacketOutcome::Accepted { .. } => "accepted",
        PacketOutcome::RejectedPeer => "rejected_peer",
        PacketOutcome::EmptyPayload => "empty_payload",
    };
    counter!("csi_sense_packets_total", "status" => status).increment(1);

    if let PacketOutcome::Accepted {
        locked: Some(force),
    } = outcome
    {
        record_calibration(force);
    }
}

/// 记录一次发布
pub fn record_publish(success: bool, bytes: usize, truncated: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("csi_sense_publish_total", "status" => status).increment(1);

    if success {
        counter!("csi_sense_publish_bytes_total").increment(bytes as u64);
        histogram!("csi_sense_payload_bytes").record(bytes as f64);
        if truncated {
            counter!("csi_sense_payload_truncated_total").increment(1);
        }
    }
}

/// 记录因环形缓冲区为空而跳过的发布周期
pub fn record_publish_skipped() {
    counter!("csi_sense_publish_total", "status" => "skipped").increment(1);
}

/// 记录运动判定
pub fn record_motion(state: &MotionState) {
    gauge!("csi_sense_motion").set(if state.motion { 1.0 } else { 0.0 });
    gauge!("csi_sense_rssi_variance").set(state.variance as f64);
    histogram!("csi_sense_rssi_variance_hist").record(state.variance as f64);
}

/// 记录校准锁定时写入的增益
pub fn record_calibration(force: &GainForce) {
    counter!("csi_sense_calibration_locks_total").increment(1);
    gauge!("csi_sense_calibration_fft_force").set(force.fft_force as f64);
    gauge!("csi_sense_calibration_agc_force").set(force.agc_force as f64);
}

/// 从快照同步管道计数器（绝对值）
pub fn record_pipeline_counters(counters: &PipelineCounters) {
    counter!("csi_sense_ring_evictions_total").absolute(counters.evictions);
    counter!("csi_sense_ring_truncated_values_total").absolute(counters.truncated);
}

/// 记录环形缓冲区当前样本数
pub fn record_ring_depth(len: usize) {
    gauge!("csi_sense_ring_depth").set(len as f64);
}

/// 感知指标聚合器
///
/// 由发布周期驱动，在内存中聚合，运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SensingMetricsAggregator {
    /// 发布周期总数
    pub total_ticks: u64,

    /// 成功发布次数
    pub published: u64,

    /// 空缓冲区跳过次数
    pub skipped: u64,

    /// 发布失败次数
    pub failed: u64,

    /// 截断发布次数
    pub truncated: u64,

    /// 判定为运动的周期数
    pub motion_ticks: u64,

    /// 运动 0/1 切换次数
    pub motion_transitions: u64,

    /// RSSI 方差统计
    pub variance_stats: RunningStats,

    /// 负载字节统计
    pub payload_stats: RunningStats,

    /// 环形缓冲区深度统计
    pub depth_stats: RunningStats,

    /// 最近一次快照中的校准结果
    pub calibration: Option<GainForce>,

    /// 最近一次快照中的管道计数器
    pub counters: PipelineCounters,

    last_motion: Option<bool>,
}

impl SensingMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次被跳过的周期
    pub fn observe_skipped(&mut self) {
        self.total_ticks += 1;
        self.skipped += 1;
    }

    /// 记录一次非空周期的快照与发布结果
    pub fn observe_publish(
        &mut self,
        snapshot: &SensingSnapshot,
        success: bool,
        bytes: usize,
        truncated: bool,
    ) {
        self.total_ticks += 1;
        if success {
            self.published += 1;
            self.payload_stats.push(bytes as f64);
            if truncated {
                self.truncated += 1;
            }
        } else {
            self.failed += 1;
        }

        let motion = snapshot.motion.motion;
        if motion {
            self.motion_ticks += 1;
        }
        if self.last_motion.is_some_and(|prev| prev != motion) {
            self.motion_transitions += 1;
        }
        self.last_motion = Some(motion);

        self.variance_stats.push(snapshot.motion.variance as f64);
        self.depth_stats.push(snapshot.samples.len() as f64);
        self.calibration = snapshot.calibration;
        self.counters = snapshot.counters;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let active = self.published + self.failed;
        MetricsSummary {
            total_ticks: self.total_ticks,
            published: self.published,
            skipped: self.skipped,
            failed: self.failed,
            truncated: self.truncated,
            failure_rate: percent(self.failed, active),
            motion_rate: percent(self.motion_ticks, active),
            motion_transitions: self.motion_transitions,
            rssi_variance: StatsSummary::from(&self.variance_stats),
            payload_bytes: StatsSummary::from(&self.payload_stats),
            ring_depth: StatsSummary::from(&self.depth_stats),
            calibration: self.calibration,
            counters: self.counters,
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub published: u64,
    pub skipped: u64,
    pub failed: u64,
    pub truncated: u64,
    pub failure_rate: f64,
    pub motion_rate: f64,
    pub motion_transitions: u64,
    pub rssi_variance: StatsSummary,
    pub payload_bytes: StatsSummary,
    pub ring_depth: StatsSummary,
    pub calibration: Option<GainForce>,
    pub counters: PipelineCounters,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Sensing Metrics Summary ===")?;
        writeln!(f, "Publish ticks: {}", self.total_ticks)?;
        writeln!(
            f,
            "Published: {} (truncated {}), skipped: {}",
            self.published, self.truncated, self.skipped
        )?;
        writeln!(f, "Failed: {} ({:.2}%)", self.failed, self.failure_rate)?;
        writeln!(
            f,
            "Motion ticks: {:.2}% ({} transitions)",
            self.motion_rate, self.motion_transitions
        )?;
        writeln!(f, "RSSI variance: {}", self.rssi_variance)?;
        writeln!(f, "Payload bytes: {}", self.payload_bytes)?;
        writeln!(f, "Ring depth: {}", self.ring_depth)?;
        writeln!(
            f,
            "Packets: accepted={}, rejected_peer={}, empty={}",
            self.counters.accepted, self.counters.rejected_peer, self.counters.empty_payload
        )?;
        writeln!(
            f,
            "Ring: evictions={}, truncated_values={}",
            self.counters.evictions, self.counters.truncated
        )?;

        match self.calibration {
            Some(force) => writeln!(
                f,
                "Calibration: fft_force={}, agc_force={}",
                force.fft_force, force.agc_force
            )?,
            None => writeln!(f, "Calibration: pending")?,
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
