//! Serial diagnostic line codec
//!
//! Firmware running with the buffer disabled prints one line per frame:
//!
//! ```text
//! CSI_DATA,<seq>,<mac>,<rssi>,<rate>,<noise_floor>,<fft_gain>,<agc_gain>,<channel>,<timestamp>,<sig_len>,<rx_state>,<len>,<first_word_invalid>,"[v0,v1,...]"
//! ```

use std::fmt::Write;
use std::str::FromStr;

use contracts::{ContractError, CsiFrame, MacAddress, PhyGain};

/// Line prefix for CSI records
pub const CSI_LINE_PREFIX: &str = "CSI_DATA";

/// Number of comma-separated fields before the quoted array
const HEADER_FIELDS: usize = 14;

/// True if `line` looks like a CSI record (other log output is ignored)
#[inline]
pub fn is_csi_line(line: &str) -> bool {
    line.trim_start().starts_with(CSI_LINE_PREFIX)
}

/// Parse one diagnostic line into a frame.
///
/// # Errors
/// Returns a decode error for a missing prefix, missing or non-numeric
/// fields, or a `len` that disagrees with the array.
pub fn parse_csi_line(line: &str) -> Result<CsiFrame, ContractError> {
    let line = line.trim();
    let (header, array) = line.split_once(",\"[").ok_or_else(|| {
        ContractError::payload_decode("missing CSI array (expected ,\"[...]\")")
    })?;

    let fields: Vec<&str> = header.split(',').map(str::trim).collect();
    if fields.len() != HEADER_FIELDS {
        return Err(ContractError::payload_decode(format!(
            "expected {} header fields, got {}",
            HEADER_FIELDS,
            fields.len()
        )));
    }
    if fields[0] != CSI_LINE_PREFIX {
        return Err(ContractError::payload_decode(format!(
            "unexpected prefix '{}'",
            fields[0]
        )));
    }

    let _seq: u64 = field(&fields, 1, "seq")?;
    let source = MacAddress::from_str(fields[2])?;
    let declared_len: usize = field(&fields, 12, "len")?;
    let first_word_invalid: u8 = field(&fields, 13, "first_word_invalid")?;

    let body = array
        .strip_suffix("]\"")
        .ok_or_else(|| ContractError::payload_decode("unterminated CSI array"))?;
    let csi = body
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<i8>()
                .map_err(|e| ContractError::payload_decode(format!("CSI value '{v}': {e}")))
        })
        .collect::<Result<Vec<i8>, _>>()?;

    if csi.len() != declared_len {
        return Err(ContractError::payload_decode(format!(
            "declared len {} but array has {} values",
            declared_len,
            csi.len()
        )));
    }

    Ok(CsiFrame {
        source,
        rssi: field(&fields, 3, "rssi")?,
        rate: field(&fields, 4, "rate")?,
        noise_floor: field(&fields, 5, "noise_floor")?,
        gain: PhyGain {
            fft_gain: field(&fields, 6, "fft_gain")?,
            agc_gain: field(&fields, 7, "agc_gain")?,
        },
        channel: field(&fields, 8, "channel")?,
        timestamp_us: field(&fields, 9, "timestamp")?,
        sig_len: field(&fields, 10, "sig_len")?,
        rx_state: field(&fields, 11, "rx_state")?,
        first_word_invalid: first_word_invalid != 0,
        csi,
    })
}

/// Render a frame as a diagnostic line (no trailing newline).
///
/// Frames with an empty CSI array have no valid line form and render as
/// `"[]"`, which [`parse_csi_line`] rejects.
pub fn format_csi_line(seq: u64, frame: &CsiFrame) -> String {
    let mut line = String::with_capacity(96 + frame.csi.len() * 5);
    write_csi_line(&mut line, seq, frame);
    line
}

/// Append the diagnostic line for `frame` to `out`, reusing its allocation.
pub fn write_csi_line(out: &mut String, seq: u64, frame: &CsiFrame) {
    // Writing into a String is infallible
    let _ = write!(
        out,
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},\"[",
        CSI_LINE_PREFIX,
        seq,
        frame.source,
        frame.rssi,
        frame.rate,
        frame.noise_floor,
        frame.gain.fft_gain,
        frame.gain.agc_gain,
        frame.channel,
        frame.timestamp_us,
        frame.sig_len,
        frame.rx_state,
        frame.csi.len(),
        u8::from(frame.first_word_invalid),
    );
    for (i, v) in frame.csi.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{v}");
    }
    out.push_str("]\"");
}

fn field<T>(fields: &[&str], index: usize, name: &str) -> Result<T, ContractError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fields[index]
        .parse()
        .map_err(|e| ContractError::payload_decode(format!("field '{name}': {e}")))
}
