//! Wire payload encoder
//!
//! Format: `v0,v1,...,vN,<motion:0|1>,<last_rssi>`, ASCII decimal, no
//! trailing separator, no NUL.

use std::fmt::Write;

/// Result of one encode call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOutcome {
    /// Complete fields present in the output (samples + trailer)
    pub fields_written: usize,
    /// Sample fields present in the output
    pub samples_written: usize,
    /// True when the byte budget cut the sample sequence short
    pub truncated: bool,
}

impl EncodeOutcome {
    /// The payload carries the motion/rssi trailer (and at least one
    /// sample when there were samples to send)
    pub fn is_complete_frame(&self) -> bool {
        self.fields_written >= 2
    }
}

/// Encode a payload into `out`, never exceeding `max_len` bytes.
///
/// `out` is cleared first and its allocation reused. The `<motion>,<rssi>`
/// trailer is always written: its length is reserved up front and only the
/// sample sequence is cut, at the last complete field. When the budget
/// cannot hold the trailer plus one sample, `out` is left empty and
/// `fields_written` is 0. A missing RSSI encodes as `0`.
pub fn encode_payload(
    samples: &[i16],
    motion: bool,
    last_rssi: Option<i8>,
    max_len: usize,
    out: &mut String,
) -> EncodeOutcome {
    out.clear();
    let mut outcome = EncodeOutcome::default();

    let rssi = i16::from(last_rssi.unwrap_or(0));
    // "<0|1>,<rssi>", plus the separator after the last sample
    let trailer_len = 2 + decimal_len(rssi) + usize::from(!samples.is_empty());
    let Some(sample_budget) = max_len.checked_sub(trailer_len) else {
        outcome.truncated = true;
        return outcome;
    };

    for &value in samples {
        if !push_field(out, value, sample_budget) {
            outcome.truncated = true;
            break;
        }
        outcome.samples_written += 1;
    }
    if outcome.samples_written == 0 && !samples.is_empty() {
        out.clear();
        return outcome;
    }

    if !out.is_empty() {
        out.push(',');
    }
    out.push(if motion { '1' } else { '0' });
    let _ = write!(out, ",{rssi}");
    outcome.fields_written = outcome.samples_written + 2;

    outcome
}

/// Characters needed for `value` in decimal
fn decimal_len(value: i16) -> usize {
    let mut rest = value.unsigned_abs();
    let mut len = usize::from(value < 0) + 1;
    while rest >= 10 {
        rest /= 10;
        len += 1;
    }
    len
}

/// Append `,value` (or `value` for the first field) if it fits.
#[inline]
fn push_field(out: &mut String, value: i16, max_len: usize) -> bool {
    let mark = out.len();
    if mark > 0 {
        out.push(',');
    }
    if write!(out, "{value}").is_err() || out.len() > max_len {
        out.truncate(mark);
        return false;
    }
    true
}
