//! Sample log to CSV conversion.
use std::io::{Read, Write};

use serde::Serialize;
use tracing::{debug, warn};

use crate::csv::TimestampedRow;
use crate::samples::read_samples;
use crate::timestamp::{remainder_bytes, sample_count, Timestamper};
use crate::vectornav::{extract_time_reference, Framer, Packet, TimeReference};
use crate::{Config, Result};

/// Outcome of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Time of the first sample, nanoseconds since the GPS epoch
    pub anchor_ns: u64,
    pub period_ns: u64,
    /// Rows written
    pub samples: u64,
    /// Bytes past the last complete sample that were not converted
    pub ignored_bytes: u64,
}

/// Frame the first packet of `telemetry` and extract its GPS time.
///
/// # Errors
/// Framing errors if no packet could be read, [crate::Error::ChecksumMismatch]
/// if the packet is corrupt, or [crate::Error::MissingTimeReference].
pub fn resolve_anchor<R: Read>(telemetry: R, framer: &Framer) -> Result<(Packet, TimeReference)> {
    let packet = framer.read_packet(telemetry)?;
    let tref = extract_time_reference(&packet)?;
    Ok((packet, tref))
}

/// Timestamp `sample_bytes` bytes of samples read from `samples` and write them
/// as CSV rows to `writer`.
///
/// The time of the first sample is taken from the first packet of `telemetry`.
/// It is resolved before anything is read from `samples` or written to `writer`,
/// so nothing is written if the telemetry is unusable. An error part way through
/// the samples can leave partial output in `writer`, it is up to the caller to
/// discard it.
///
/// # Errors
/// Any error resolving the anchor, reading the samples, or writing rows.
pub fn convert<T, S, W>(
    telemetry: T,
    samples: S,
    sample_bytes: u64,
    config: &Config,
    writer: W,
) -> Result<Summary>
where
    T: Read,
    S: Read,
    W: Write,
{
    convert_with(&Framer::default(), telemetry, samples, sample_bytes, config, writer)
}

/// Same as [convert] using `framer` to read the telemetry packet.
///
/// # Errors
/// See [convert].
pub fn convert_with<T, S, W>(
    framer: &Framer,
    telemetry: T,
    samples: S,
    sample_bytes: u64,
    config: &Config,
    mut writer: W,
) -> Result<Summary>
where
    T: Read,
    S: Read,
    W: Write,
{
    let (packet, tref) = resolve_anchor(telemetry, framer)?;
    debug!("anchor from {packet}");

    let stamper = Timestamper::new(tref.gps_nanos, config.period_ns());
    let count = sample_count(sample_bytes, config.channel_count);
    let ignored_bytes = remainder_bytes(sample_bytes, config.channel_count);
    if ignored_bytes > 0 {
        warn!(
            ignored_bytes,
            "sample data does not end on a sample boundary, trailing bytes ignored"
        );
    }
    debug!(
        anchor_ns = stamper.anchor_ns,
        period_ns = stamper.period_ns,
        count,
        "timestamping samples"
    );

    let mut written = 0;
    for sample in read_samples(samples, config.channel_count, count) {
        let sample = sample?;
        let row = TimestampedRow {
            timestamp_ns: stamper.timestamp(sample.index)?,
            channels: sample.channels,
        };
        row.write_to(&mut writer)?;
        written += 1;
    }
    writer.flush()?;

    if written < count {
        warn!(
            expected = count,
            written,
            "sample data ended before the expected number of samples"
        );
    }

    Ok(Summary {
        anchor_ns: stamper.anchor_ns,
        period_ns: stamper.period_ns,
        samples: written,
        ignored_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectornav::{checksum_trailer, SYNC};
    use crate::Error;

    fn time_packet(gps_nanos: u64) -> Vec<u8> {
        let mut dat = vec![SYNC, 0x01, 0x02, 0x00];
        dat.extend_from_slice(&gps_nanos.to_le_bytes());
        let trailer = checksum_trailer(&dat[1..]);
        dat.extend_from_slice(&trailer);
        dat
    }

    fn encode(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn convert_rows() {
        let telemetry = time_packet(1000);
        let samples = encode(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let config = Config::new(100.0, 2).unwrap();
        let mut out: Vec<u8> = Vec::new();

        let summary = convert(
            &telemetry[..],
            &samples[..],
            samples.len() as u64,
            &config,
            &mut out,
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1000,1,2\n10001000,3,4\n20001000,5,6\n"
        );
        assert_eq!(
            summary,
            Summary {
                anchor_ns: 1000,
                period_ns: 10_000_000,
                samples: 3,
                ignored_bytes: 0,
            }
        );
    }

    #[test]
    fn trailing_bytes_ignored() {
        let telemetry = time_packet(0);
        let mut samples = encode(&[1.0, 2.0]);
        samples.extend_from_slice(&[0xab; 5]);
        let config = Config::new(200.0, 1).unwrap();
        let mut out: Vec<u8> = Vec::new();

        let summary = convert(
            &telemetry[..],
            &samples[..],
            samples.len() as u64,
            &config,
            &mut out,
        )
        .unwrap();

        assert_eq!(summary.samples, 2);
        assert_eq!(summary.ignored_bytes, 5);
        assert_eq!(String::from_utf8(out).unwrap(), "0,1\n5000000,2\n");
    }

    #[test]
    fn nothing_written_without_anchor() {
        let mut telemetry = time_packet(1000);
        telemetry[5] ^= 0xff;
        let samples = encode(&[1.0, 2.0]);
        let config = Config::new(100.0, 2).unwrap();
        let mut out: Vec<u8> = Vec::new();

        let err = convert(
            &telemetry[..],
            &samples[..],
            samples.len() as u64,
            &config,
            &mut out,
        )
        .unwrap_err();

        assert!(matches!(err, Error::ChecksumMismatch { .. }), "{err:?}");
        assert!(out.is_empty());
    }

    #[test]
    fn resolve_anchor_reads_first_packet_only() {
        let mut telemetry = time_packet(77);
        telemetry.extend(time_packet(88));

        let (packet, tref) = resolve_anchor(&telemetry[..], &Framer::default()).unwrap();
        assert_eq!(packet.data.len(), 14);
        assert_eq!(tref.gps_nanos, 77);
    }
}
