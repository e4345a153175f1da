//! Per-frame serial line output
//!
//! With the sample buffer disabled the firmware prints every accepted frame
//! as a `CSI_DATA` line. [`SerialLineWriter`] produces the same stream on
//! stdout or into a file, which [`ReplaySource`](crate::ReplaySource) can
//! read back.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use contracts::CsiFrame;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{IngestionError, Result};
use crate::serial_line::write_csi_line;

/// Target name that selects stdout
pub const STDOUT_TARGET: &str = "-";

struct WriterState {
    out: BufWriter<Box<dyn Write + Send>>,
    line: String,
    seq: u64,
}

/// Writes one diagnostic line per frame; sequence numbers start at 0
pub struct SerialLineWriter {
    name: String,
    state: Mutex<WriterState>,
    lines: AtomicU64,
    errors: AtomicU64,
}

impl SerialLineWriter {
    pub fn new(name: impl Into<String>, writer: impl Write + Send + 'static) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(WriterState {
                out: BufWriter::new(Box::new(writer)),
                line: String::with_capacity(1024),
                seq: 0,
            }),
            lines: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn stdout() -> Self {
        Self::new("stdout", io::stdout())
    }

    /// Open `target`: `-` for stdout, otherwise a file (truncated).
    ///
    /// # Errors
    /// Returns [`IngestionError::SerialOutput`] if the file cannot be created.
    pub fn open(target: &Path) -> Result<Self> {
        if target.as_os_str() == STDOUT_TARGET {
            return Ok(Self::stdout());
        }

        let file = File::create(target).map_err(|source| IngestionError::SerialOutput {
            path: target.to_path_buf(),
            source,
        })?;
        Ok(Self::new(target.display().to_string(), file))
    }

    /// Print `frame` as the next line. Failures are counted, never raised.
    pub fn write_frame(&self, frame: &CsiFrame) -> bool {
        let mut state = self.state.lock();
        let WriterState { out, line, seq } = &mut *state;

        line.clear();
        write_csi_line(line, *seq, frame);
        line.push('\n');

        match out.write_all(line.as_bytes()) {
            Ok(()) => {
                *seq += 1;
                self.lines.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                if self.errors.fetch_add(1, Ordering::Relaxed) == 0 {
                    warn!(output = %self.name, error = %e, "serial line write failed");
                } else {
                    debug!(output = %self.name, error = %e, "serial line write failed");
                }
                false
            }
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        self.state.lock().out.flush()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lines written so far
    pub fn lines_written(&self) -> u64 {
        self.lines.load(Ordering::Relaxed)
    }

    pub fn write_errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for SerialLineWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLineWriter")
            .field("name", &self.name)
            .field("lines", &self.lines_written())
            .field("errors", &self.write_errors())
            .finish()
    }
}
