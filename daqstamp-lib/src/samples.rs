//! Reading DAQ sample slices.
//!
//! A sample file is a flat sequence of little-endian `f64` values, one slice of
//! `channel_count` values per sample, with no header.
use std::io::{ErrorKind, Read};

use tracing::trace;

use crate::timestamp::CHANNEL_WIDTH;
use crate::{Error, Result};

/// One sample: a reading for every channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Zero based position in the sample stream
    pub index: u64,
    pub channels: Vec<f64>,
}

impl Sample {
    /// Decode a slice of little-endian `f64` values. Trailing bytes that do not
    /// make up a whole value are ignored.
    #[must_use]
    pub fn decode(index: u64, buf: &[u8]) -> Sample {
        let channels = buf
            .chunks_exact(CHANNEL_WIDTH)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect();
        Sample { index, channels }
    }
}

/// Iterates over the samples in a byte stream.
///
/// At most `count` samples are produced. The iterator stops early, without
/// error, if the stream ends on a slice boundary. A stream ending within a
/// slice is an [Error::Truncated].
pub struct SampleIter<R>
where
    R: Read,
{
    reader: R,
    channel_count: usize,
    count: u64,
    index: u64,
    buf: Vec<u8>,
    done: bool,
}

impl<R> SampleIter<R>
where
    R: Read,
{
    /// The slice buffer is allocated only when there is at least one sample to
    /// read.
    pub fn new(reader: R, channel_count: usize, count: u64) -> Self {
        let width = CHANNEL_WIDTH.checked_mul(channel_count).unwrap_or(0);
        let done = width == 0 || count == 0;
        SampleIter {
            reader,
            channel_count,
            count,
            index: 0,
            buf: if done { Vec::new() } else { vec![0u8; width] },
            done,
        }
    }

    /// Number of samples produced so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.index
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn fill(&mut self) -> Result<bool> {
        let mut filled = 0;
        while filled < self.buf.len() {
            match self.reader.read(&mut self.buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        if filled == 0 {
            return Ok(false);
        }
        if filled < self.buf.len() {
            return Err(Error::Truncated {
                expected: self.buf.len(),
                actual: filled,
            });
        }
        Ok(true)
    }
}

impl<R> Iterator for SampleIter<R>
where
    R: Read,
{
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.index >= self.count {
            return None;
        }
        match self.fill() {
            Ok(true) => {
                let sample = Sample::decode(self.index, &self.buf);
                trace!(index = self.index, "sample");
                self.index += 1;
                Some(Ok(sample))
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Iterate over `count` samples of `channel_count` channels read from `reader`.
pub fn read_samples<R>(reader: R, channel_count: usize, count: u64) -> SampleIter<R>
where
    R: Read,
{
    SampleIter::new(reader, channel_count, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn decode_sample() {
        let dat = encode(&[1.0, -2.5, 1e-300]);
        let sample = Sample::decode(7, &dat);
        assert_eq!(sample.index, 7);
        assert_eq!(sample.channels, vec![1.0, -2.5, 1e-300]);
    }

    #[test]
    fn iterate_samples() {
        let dat = encode(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let samples: Vec<Sample> = read_samples(&dat[..], 2, 3)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].channels, vec![1.0, 2.0]);
        assert_eq!(samples[2].index, 2);
        assert_eq!(samples[2].channels, vec![5.0, 6.0]);
    }

    #[test]
    fn stops_at_count() {
        let mut dat = encode(&[1.0, 2.0, 3.0, 4.0]);
        // remainder bytes past the last whole sample are never read
        dat.extend_from_slice(&[0xff; 5]);

        let mut iter = read_samples(&dat[..], 2, 2);
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().is_none());
        assert_eq!(iter.position(), 2);
    }

    #[test]
    fn stops_at_end_of_stream() {
        let dat = encode(&[1.0, 2.0]);
        let samples: Vec<_> = read_samples(&dat[..], 1, 10).collect();
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn partial_slice_is_truncated() {
        let mut dat = encode(&[1.0, 2.0]);
        dat.extend_from_slice(&[0; 3]);

        let mut iter = read_samples(&dat[..], 2, 2);
        assert!(iter.next().unwrap().is_ok());
        let err = iter.next().unwrap().unwrap_err();
        assert!(
            matches!(
                err,
                Error::Truncated {
                    expected: 16,
                    actual: 3
                }
            ),
            "{err:?}"
        );
        assert!(iter.next().is_none());
    }

    #[test]
    fn no_buffer_without_samples() {
        let dat = encode(&[1.0]);
        // a slice of this width could never be allocated
        let mut iter = read_samples(&dat[..], 1 << 40, 0);
        assert!(iter.buf.is_empty());
        assert!(iter.next().is_none());

        let mut iter = read_samples(&dat[..], usize::MAX, 3);
        assert!(iter.buf.is_empty());
        assert!(iter.next().is_none());
    }

    #[test]
    fn zero_channels_yields_nothing() {
        let dat = encode(&[1.0]);
        assert!(read_samples(&dat[..], 0, 5).next().is_none());
    }
}
