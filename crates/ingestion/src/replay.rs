//! Replay source - 回放串口诊断日志
//!
//! 读取固件串口输出（`CSI_DATA,...` 行），按固定速率在后台线程中
//! 通过回调重新投递，行为与真实驱动回调一致。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{CsiFrame, CsiFrameCallback, CsiSource};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::{pacing_target, IngestionMetrics};
use crate::error::{IngestionError, Result};
use crate::serial_line::{is_csi_line, parse_csi_line};

/// Replay 配置
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// 投递速率 (Hz)；0 表示不限速
    pub rate_hz: f64,

    /// 是否循环回放
    pub loop_playback: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            rate_hz: 100.0,
            loop_playback: false,
        }
    }
}

impl ReplayConfig {
    fn interval(&self) -> Option<Duration> {
        (self.rate_hz.is_finite() && self.rate_hz > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / self.rate_hz))
    }
}

/// Replay source - 从诊断日志回放 CSI 帧
pub struct ReplaySource {
    name: String,
    frames: Arc<Vec<CsiFrame>>,
    config: ReplayConfig,
    metrics: Arc<IngestionMetrics>,
    listening: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReplaySource {
    /// 从文件加载
    pub fn load(path: &Path, config: ReplayConfig) -> Result<Self> {
        let file = File::open(path).map_err(|source| IngestionError::ReplayRead {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "replay".to_string());

        Self::from_reader(name, BufReader::new(file), config).map_err(|e| match e {
            IngestionError::ReplayRead { source, .. } => IngestionError::ReplayRead {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// 从任意行读取器加载
    ///
    /// Lines without the `CSI_DATA` prefix are interleaved log output and
    /// are skipped; malformed `CSI_DATA` lines count as parse errors.
    pub fn from_reader(
        name: impl Into<String>,
        reader: impl BufRead,
        config: ReplayConfig,
    ) -> Result<Self> {
        let name = name.into();
        let metrics = Arc::new(IngestionMetrics::new());
        let mut frames = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| IngestionError::ReplayRead {
                path: name.clone().into(),
                source,
            })?;
            if !is_csi_line(&line) {
                continue;
            }
            match parse_csi_line(&line) {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    metrics.record_parse_error();
                    debug!(source = %name, line = line_no + 1, error = %e, "Skipping line");
                }
            }
        }

        let parse_errors = metrics.snapshot().parse_errors;
        if frames.is_empty() {
            return Err(IngestionError::EmptyReplay { name, parse_errors });
        }
        if parse_errors > 0 {
            warn!(source = %name, parse_errors, "Replay file has unparsable records");
        }
        info!(source = %name, frames = frames.len(), "Replay loaded");

        Ok(Self {
            name,
            frames: Arc::new(frames),
            config,
            metrics,
            listening: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        })
    }

    /// 已加载的帧数
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    /// 阻塞等待单次回放结束（循环模式下直到 `stop`）
    pub fn join(&self) {
        if let Some(handle) = self.thread_handle.lock().take() {
            if handle.join().is_err() {
                warn!(source = %self.name, "Replay thread panicked");
            }
        }
    }
}

impl CsiSource for ReplaySource {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn listen(&self, callback: CsiFrameCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let listening = self.listening.clone();
        let name = self.name.clone();
        let frames = self.frames.clone();
        let metrics = self.metrics.clone();
        let interval = self.config.interval();
        let loop_playback = self.config.loop_playback;

        let handle = thread::spawn(move || {
            debug!(source = %name, "Replay thread started");

            'replay: loop {
                let start_time = Instant::now();

                for (i, frame) in frames.iter().enumerate() {
                    if !listening.load(Ordering::Relaxed) {
                        debug!(source = %name, "Replay stopped");
                        break 'replay;
                    }

                    if let Some(interval) = interval {
                        let target_elapsed = pacing_target(interval, i as u64);
                        let actual_elapsed = start_time.elapsed();
                        if target_elapsed > actual_elapsed {
                            thread::sleep(target_elapsed - actual_elapsed);
                        }
                    }

                    callback(frame);
                    metrics.record_received();
                }

                if !loop_playback {
                    info!(source = %name, "Replay completed");
                    break;
                }

                debug!(source = %name, "Looping replay");
            }

            listening.store(false, Ordering::SeqCst);
        });

        *self.thread_handle.lock() = Some(handle);
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        self.join();
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial_line::format_csi_line;
    use contracts::MacAddress;
    use std::io::{Cursor, Write};
    use std::sync::atomic::AtomicU64;

    fn log_text(frames: usize) -> String {
        let mut text = String::from("I (100) csi_recv: boot\n");
        for i in 0..frames {
            let frame = CsiFrame {
                source: MacAddress::new([0x1a, 0, 0, 0, 0, 0]),
                rssi: -50 - (i % 10) as i8,
                csi: vec![1, 2, 3, 4],
                ..Default::default()
            };
            text.push_str(&format_csi_line(i as u64, &frame));
            text.push('\n');
        }
        text
    }

    fn fast() -> ReplayConfig {
        ReplayConfig {
            rate_hz: 0.0,
            loop_playback: false,
        }
    }

    #[test]
    fn test_loads_records_and_skips_log_noise() {
        let mut text = log_text(5);
        text.push_str("CSI_DATA,garbage\n");

        let source = ReplaySource::from_reader("mem", Cursor::new(text), fast()).unwrap();
        assert_eq!(source.len(), 5);
        assert_eq!(source.metrics().snapshot().parse_errors, 1);
    }

    #[test]
    fn test_empty_replay_is_error() {
        let result = ReplaySource::from_reader("mem", Cursor::new("no records\n"), fast());
        assert!(matches!(result, Err(IngestionError::EmptyReplay { .. })));
    }

    #[test]
    fn test_replays_every_frame_once() {
        let source = ReplaySource::from_reader("mem", Cursor::new(log_text(20)), fast()).unwrap();
        let count = Arc::new(AtomicU64::new(0));
        let seen = count.clone();

        source.listen(Arc::new(move |frame: &CsiFrame| {
            assert_eq!(frame.csi.len(), 4);
            seen.fetch_add(1, Ordering::Relaxed);
        }));
        source.join();

        assert_eq!(count.load(Ordering::Relaxed), 20);
        assert_eq!(source.metrics().snapshot().frames_received, 20);
        assert!(!source.is_listening());
    }

    #[test]
    fn test_loop_playback_until_stopped() {
        let config = ReplayConfig {
            rate_hz: 1000.0,
            loop_playback: true,
        };
        let source = ReplaySource::from_reader("mem", Cursor::new(log_text(3)), config).unwrap();
        let count = Arc::new(AtomicU64::new(0));
        let seen = count.clone();

        source.listen(Arc::new(move |_: &CsiFrame| {
            seen.fetch_add(1, Ordering::Relaxed);
        }));
        thread::sleep(Duration::from_millis(50));
        source.stop();

        assert!(count.load(Ordering::Relaxed) > 3);
        assert!(!source.is_listening());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(log_text(4).as_bytes()).unwrap();

        let source = ReplaySource::load(file.path(), fast()).unwrap();
        assert_eq!(source.len(), 4);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = ReplaySource::load(Path::new("/nonexistent/csi.log"), fast())
            .err()
            .unwrap();
        assert!(err.to_string().contains("/nonexistent/csi.log"));
    }
}
