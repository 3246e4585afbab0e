//! Sample timestamp extrapolation.
//!
//! Every sample time is derived from a single anchor and the nominal sample
//! period: `anchor + period * index`. The period is the reciprocal of the sample
//! rate in nanoseconds, computed in single precision and truncated toward zero.
//! The truncation error accumulates over a recording.

use crate::{Error, Result};

/// Width in bytes of one channel reading.
pub const CHANNEL_WIDTH: usize = std::mem::size_of::<f64>();

/// Nominal sample period in nanoseconds for `sample_rate_hz`.
///
/// Evaluated as `(1 / rate) * 1e9` in `f32` and truncated, fractional
/// nanoseconds are dropped.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn period_ns(sample_rate_hz: f64) -> u64 {
    let rate = sample_rate_hz as f32;
    let period = (1.0f32 / rate) * 1_000_000_000.0f32;
    period as u64
}

/// Bytes in one sample of `channel_count` channels, `None` if zero or too large
/// for a `u64`.
fn slice_width(channel_count: usize) -> Option<u64> {
    u64::try_from(channel_count)
        .ok()?
        .checked_mul(CHANNEL_WIDTH as u64)
        .filter(|w| *w > 0)
}

/// Number of complete samples in a stream of `file_size` bytes with `channel_count`
/// `f64` channels per sample. Remainder bytes are not a sample.
#[must_use]
pub fn sample_count(file_size: u64, channel_count: usize) -> u64 {
    slice_width(channel_count).map_or(0, |width| file_size / width)
}

/// Bytes past the last complete sample.
#[must_use]
pub fn remainder_bytes(file_size: u64, channel_count: usize) -> u64 {
    slice_width(channel_count).map_or(file_size, |width| file_size % width)
}

/// Computes sample timestamps from an anchor time and a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamper {
    /// Time of sample 0, nanoseconds
    pub anchor_ns: u64,
    pub period_ns: u64,
}

impl Timestamper {
    #[must_use]
    pub fn new(anchor_ns: u64, period_ns: u64) -> Self {
        Self {
            anchor_ns,
            period_ns,
        }
    }

    #[must_use]
    pub fn with_rate(anchor_ns: u64, sample_rate_hz: f64) -> Self {
        Self::new(anchor_ns, period_ns(sample_rate_hz))
    }

    /// Timestamp of sample `index`.
    ///
    /// # Errors
    /// [Error::TimestampOverflow] if the timestamp does not fit in a `u64`.
    pub fn timestamp(&self, index: u64) -> Result<u64> {
        self.period_ns
            .checked_mul(index)
            .and_then(|offset| self.anchor_ns.checked_add(offset))
            .ok_or(Error::TimestampOverflow { index })
    }
}
