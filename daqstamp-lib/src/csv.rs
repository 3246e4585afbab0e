//! CSV row output.
//!
//! Rows are `timestamp,<channel 0>,...,<channel n-1>` with the timestamp in
//! nanoseconds since the GPS epoch. Channel values use the shortest decimal
//! representation that reads back to the same `f64`, in exponent form for
//! magnitudes below `1e-4` or from `1e16` up.
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Extension given to derived output paths.
pub const CSV_EXTENSION: &str = "CSV";

/// A sample with its computed time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampedRow {
    pub timestamp_ns: u64,
    pub channels: Vec<f64>,
}

impl TimestampedRow {
    /// Write this row, including the line terminator, to `writer`.
    ///
    /// # Errors
    /// Any error writing to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_row(writer, self.timestamp_ns, &self.channels)
    }
}

/// Write one CSV row to `writer`.
///
/// # Errors
/// Any error writing to `writer`.
pub fn write_row<W: Write>(writer: &mut W, timestamp_ns: u64, channels: &[f64]) -> Result<()> {
    write!(writer, "{timestamp_ns}")?;
    for value in channels {
        if uses_exponent(*value) {
            write!(writer, ",{value:e}")?;
        } else {
            write!(writer, ",{value}")?;
        }
    }
    writer.write_all(b"\n")?;
    Ok(())
}

// Same magnitude cutoffs as `f64` Debug formatting.
fn uses_exponent(value: f64) -> bool {
    let abs = value.abs();
    value.is_finite() && value != 0.0 && !(1e-4..1e16).contains(&abs)
}

/// Derive the output path for a sample file by replacing its 3 character
/// extension with `CSV`, e.g., `run.DAQ` becomes `run.CSV`.
///
/// # Errors
/// [Error::Usage] if `path` does not have a 3 character extension.
pub fn csv_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.chars().count() == 3 => Ok(path.with_extension(CSV_EXTENSION)),
        _ => Err(Error::Usage(format!(
            "cannot derive output path from {}: expected a 3 character extension",
            path.display()
        ))),
    }
}
