//! Payload decoding and GPS time extraction.
use std::collections::BTreeMap;

#[cfg(feature = "timecode")]
use hifitime::Epoch;
use serde::Serialize;
use tracing::debug;

use super::fields::{Group, Kind, TIME_GPS};
use super::Packet;
use crate::{Error, Result};

/// UTC time as reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Utc {
    /// Years since 2000
    pub year: i8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
}

/// A decoded payload field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Utc(Utc),
    Bytes(Vec<u8>),
}

impl Value {
    fn decode(kind: Kind, buf: &[u8]) -> Value {
        match kind {
            Kind::U8 => Value::U8(buf[0]),
            Kind::U16 => Value::U16(u16::from_le_bytes([buf[0], buf[1]])),
            Kind::U32 => Value::U32(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])),
            Kind::U64 => Value::U64(u64::from_le_bytes([
                buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
            ])),
            Kind::F32(_) => Value::F32(
                buf.chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                    .collect(),
            ),
            Kind::F64(_) => Value::F64(
                buf.chunks_exact(8)
                    .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                    .collect(),
            ),
            Kind::Utc => Value::Utc(Utc {
                year: i8::from_le_bytes([buf[0]]),
                month: buf[1],
                day: buf[2],
                hour: buf[3],
                minute: buf[4],
                second: buf[5],
                millisecond: u16::from_le_bytes([buf[6], buf[7]]),
            }),
            Kind::Bytes(_) => Value::Bytes(buf.to_vec()),
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }
}

/// Payload fields of a packet keyed by group and field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompositeData {
    pub groups: BTreeMap<Group, BTreeMap<&'static str, Value>>,
}

impl CompositeData {
    /// Decode the payload of `packet` following its header flags.
    ///
    /// The checksum is not checked here, see [Packet::validate].
    ///
    /// # Errors
    /// [Error::Framing] if the header flags fields without a known width, or
    /// [Error::Truncated] if the payload is shorter than the flags describe.
    pub fn parse(packet: &Packet) -> Result<CompositeData> {
        let defs = packet.header.field_defs()?;
        let payload = packet.payload();
        let need: usize = defs.iter().map(|(_, d)| d.width()).sum();
        if payload.len() < need {
            return Err(Error::Truncated {
                expected: need,
                actual: payload.len(),
            });
        }

        let mut data = CompositeData::default();
        let mut offset = 0;
        for (group, def) in defs {
            let end = offset + def.width();
            let value = Value::decode(def.kind, &payload[offset..end]);
            data.groups.entry(group).or_default().insert(def.name, value);
            offset = end;
        }
        Ok(data)
    }

    #[must_use]
    pub fn get(&self, group: Group, name: &str) -> Option<&Value> {
        self.groups.get(&group)?.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn has_time_gps(&self) -> bool {
        self.time_gps().is_some()
    }

    /// GPS time in nanoseconds from the common group, falling back to the time
    /// group.
    #[must_use]
    pub fn time_gps(&self) -> Option<TimeReference> {
        [Group::Common, Group::Time].into_iter().find_map(|group| {
            self.get(group, TIME_GPS)
                .and_then(Value::as_u64)
                .map(|gps_nanos| TimeReference { gps_nanos, group })
        })
    }
}

/// Absolute time anchor taken from a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeReference {
    /// Nanoseconds since the GPS epoch, 1980-01-06T00:00:00 UTC
    pub gps_nanos: u64,
    /// Group the time was read from
    pub group: Group,
}

#[cfg(feature = "timecode")]
impl TimeReference {
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        Epoch::from_gpst_nanoseconds(self.gps_nanos)
    }
}

/// Validate `packet` and extract its GPS time.
///
/// # Errors
/// [Error::ChecksumMismatch] if the packet is corrupt, [Error::MissingTimeReference]
/// if the packet does not contain a GPS time, or any payload decoding error.
pub fn extract_time_reference(packet: &Packet) -> Result<TimeReference> {
    packet.validate()?;
    let data = CompositeData::parse(packet)?;
    let Some(tref) = data.time_gps() else {
        debug!(fields = data.len(), "no gps time in {packet}");
        return Err(Error::MissingTimeReference);
    };
    debug!(gps_nanos = tref.gps_nanos, group = ?tref.group, "time reference");
    Ok(tref)
}

#[cfg(test)]
mod tests {
    use super::super::{checksum_trailer, SYNC};
    use super::*;

    fn packet(groups: u8, words: &[u16], payload: &[u8]) -> Packet {
        let mut dat = vec![SYNC, groups];
        for w in words {
            dat.extend_from_slice(&w.to_le_bytes());
        }
        dat.extend_from_slice(payload);
        let trailer = checksum_trailer(&dat[1..]);
        dat.extend_from_slice(&trailer);
        Packet::decode(&dat).unwrap()
    }

    #[test]
    fn parse_common_fields() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&1_234_567_890u64.to_le_bytes());
        for v in [1.5f32, -2.0, 90.0] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        payload.extend_from_slice(&0x0102u16.to_le_bytes());
        // TimeGps, YawPitchRoll, InsStatus
        let pkt = packet(0x01, &[1 << 1 | 1 << 3 | 1 << 12], &payload);

        let data = CompositeData::parse(&pkt).unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data.get(Group::Common, TIME_GPS), Some(&Value::U64(1_234_567_890)));
        assert_eq!(
            data.get(Group::Common, "YawPitchRoll"),
            Some(&Value::F32(vec![1.5, -2.0, 90.0]))
        );
        assert_eq!(data.get(Group::Common, "InsStatus"), Some(&Value::U16(0x0102)));
        assert_eq!(data.get(Group::Time, TIME_GPS), None);
    }

    #[test]
    fn parse_time_group_utc() {
        let payload = [24u8, 10, 16, 12, 30, 45, 0xe8, 0x03];
        let pkt = packet(0x02, &[1 << 6], &payload);

        let data = CompositeData::parse(&pkt).unwrap();

        assert_eq!(
            data.get(Group::Time, "TimeUtc"),
            Some(&Value::Utc(Utc {
                year: 24,
                month: 10,
                day: 16,
                hour: 12,
                minute: 30,
                second: 45,
                millisecond: 1000,
            }))
        );
        assert!(!data.has_time_gps());
    }

    #[test]
    fn time_gps_from_time_group() {
        let mut payload = 7u64.to_le_bytes().to_vec();
        payload.extend_from_slice(&42u64.to_le_bytes());
        // TimeStartup, TimeGps
        let pkt = packet(0x02, &[0b11], &payload);

        let tref = extract_time_reference(&pkt).unwrap();
        assert_eq!(tref.gps_nanos, 42);
        assert_eq!(tref.group, Group::Time);
    }

    #[test]
    fn common_group_time_preferred() {
        let mut payload = 100u64.to_le_bytes().to_vec();
        payload.extend_from_slice(&200u64.to_le_bytes());
        let pkt = packet(0x03, &[1 << 1, 1 << 1], &payload);

        let tref = extract_time_reference(&pkt).unwrap();
        assert_eq!(tref.gps_nanos, 100);
        assert_eq!(tref.group, Group::Common);
    }

    #[test]
    fn missing_time_reference() {
        let payload = 99u64.to_le_bytes();
        // TimeStartup only
        let pkt = packet(0x01, &[1], &payload);

        let err = extract_time_reference(&pkt).unwrap_err();
        assert!(matches!(err, Error::MissingTimeReference), "{err:?}");
    }

    #[test]
    fn missing_time_reference_without_groups() {
        let pkt = packet(0x01, &[1 << 1], &5u64.to_le_bytes());
        assert_eq!(extract_time_reference(&pkt).unwrap().gps_nanos, 5);

        // same packet with the common group flag, its field word and payload removed
        let pkt = packet(0x00, &[], &[]);
        assert_eq!(pkt.data.len(), 4);

        let err = extract_time_reference(&pkt).unwrap_err();
        assert!(matches!(err, Error::MissingTimeReference), "{err:?}");
    }

    #[test]
    fn corrupt_packet_not_parsed() {
        let mut pkt = packet(0x01, &[1 << 1], &5u64.to_le_bytes());
        pkt.data[4] ^= 0x10;

        let err = extract_time_reference(&pkt).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }), "{err:?}");
    }

    #[test]
    fn serializes_by_group_and_name() {
        let mut payload = 42u64.to_le_bytes().to_vec();
        payload.extend_from_slice(&[24u8, 1, 2, 3, 4, 5, 6, 0]);
        let pkt = packet(0x02, &[1 << 1 | 1 << 6], &payload);

        let data = CompositeData::parse(&pkt).unwrap();
        let json = serde_json::to_value(&data).unwrap();

        assert_eq!(json["groups"]["Time"]["TimeGps"], 42);
        assert_eq!(json["groups"]["Time"]["TimeUtc"]["year"], 24);
        assert_eq!(json["groups"]["Time"]["TimeUtc"]["millisecond"], 6);
    }

    #[cfg(feature = "timecode")]
    #[test]
    fn epoch_from_gps_nanos() {
        let tref = TimeReference {
            gps_nanos: 0,
            group: Group::Common,
        };
        assert_eq!(tref.epoch(), Epoch::from_gpst_nanoseconds(0));
        let tref = TimeReference {
            gps_nanos: 1_000_000_000,
            group: Group::Common,
        };
        assert_eq!((tref.epoch() - Epoch::from_gpst_nanoseconds(0)).to_seconds(), 1.0);
    }
}
