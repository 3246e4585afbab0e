//! VectorNav binary output packet framing.
//!
//! A binary output packet is laid out as:
//!
//! | bytes | contents |
//! |---|---|
//! | 1 | sync byte `0xFA` |
//! | 1 | group byte, bit `n` set when group `n + 1` is present |
//! | 2 per group | little-endian field word for each present group |
//! | variable | payload, fields in group then field bit order |
//! | 2 | big-endian checksum over everything after the sync byte |
//!
//! The total length is known once the header has been read, so a packet is read
//! in two steps: the header, then the remaining bytes.
mod checksum;
mod composite;
pub mod fields;

use std::fmt::Display;
use std::io::{ErrorKind, Read};

use serde::Serialize;
use tracing::{debug, trace};

use crate::{Error, Result};

pub use checksum::{checksum, checksum_trailer};
pub use composite::{extract_time_reference, CompositeData, TimeReference, Utc, Value};
pub use fields::{FieldDef, Group, Kind};

/// First byte of every binary output packet.
pub const SYNC: u8 = 0xfa;
/// Sync byte plus group byte.
pub const PREFIX_LEN: usize = 2;
/// Width of the checksum trailer.
pub const CRC_LEN: usize = 2;
/// Largest packet length accepted by default.
pub const MAX_PACKET_LEN: usize = 600;

/// Group byte bit signaling an extension group byte follows.
const GROUP_EXTENSION: u8 = 0x80;
/// Field word bit signaling an extension field word follows.
const FIELD_EXTENSION: u16 = 0x8000;

/// Binary output packet header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Raw group byte
    pub groups: u8,
    /// Field word for each present group, in payload order
    pub fields: Vec<(Group, u16)>,
}

impl Header {
    /// Decode the header from the start of `buf`.
    ///
    /// # Errors
    /// [Error::Truncated] if `buf` is shorter than the header it describes, or
    /// [Error::Framing] if the sync byte or group byte are invalid.
    pub fn decode(buf: &[u8]) -> Result<Header> {
        if buf.len() < PREFIX_LEN {
            return Err(Error::Truncated {
                expected: PREFIX_LEN,
                actual: buf.len(),
            });
        }
        let groups = decode_prefix(buf[0], buf[1])?;
        let len = header_len(groups);
        if buf.len() < len {
            return Err(Error::Truncated {
                expected: len,
                actual: buf.len(),
            });
        }

        let fields = Group::flagged(groups)
            .zip(buf[PREFIX_LEN..len].chunks_exact(2))
            .map(|(group, word)| (group, u16::from_le_bytes([word[0], word[1]])))
            .collect();

        Ok(Header { groups, fields })
    }

    /// Length of the header, including the sync byte.
    #[must_use]
    pub fn len(&self) -> usize {
        PREFIX_LEN + 2 * self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field word for `group`, if the group is present.
    #[must_use]
    pub fn field_word(&self, group: Group) -> Option<u16> {
        self.fields
            .iter()
            .find_map(|(g, w)| if *g == group { Some(*w) } else { None })
    }

    /// Present field definitions in payload order.
    ///
    /// # Errors
    /// [Error::Framing] if an extension bit or a field without a known width is
    /// flagged.
    pub fn field_defs(&self) -> Result<Vec<(Group, &'static FieldDef)>> {
        let mut defs = Vec::default();
        for (group, word) in &self.fields {
            if word & FIELD_EXTENSION != 0 {
                return Err(Error::framing(format!(
                    "{group:?} field word {word:#06x} uses extension fields"
                )));
            }
            for bit in (0..15u8).filter(|b| word & (1u16 << *b) != 0) {
                let Some(def) = group.field(bit) else {
                    return Err(Error::framing(format!(
                        "{group:?} field bit {bit} has no fixed width"
                    )));
                };
                defs.push((*group, def));
            }
        }
        Ok(defs)
    }

    /// Number of payload bytes described by this header.
    ///
    /// # Errors
    /// See [Header::field_defs].
    pub fn payload_len(&self) -> Result<usize> {
        Ok(self.field_defs()?.iter().map(|(_, d)| d.width()).sum())
    }

    /// Total packet length: header, payload and checksum.
    ///
    /// # Errors
    /// See [Header::field_defs].
    pub fn packet_len(&self) -> Result<usize> {
        Ok(self.len() + self.payload_len()? + CRC_LEN)
    }
}

fn decode_prefix(sync: u8, groups: u8) -> Result<u8> {
    if sync != SYNC {
        return Err(Error::framing(format!(
            "expected sync byte {SYNC:#04x}, got {sync:#04x}"
        )));
    }
    if groups & GROUP_EXTENSION != 0 {
        return Err(Error::framing(format!(
            "group byte {groups:#04x} uses extension groups"
        )));
    }
    Ok(groups)
}

fn header_len(groups: u8) -> usize {
    PREFIX_LEN + 2 * Group::flagged(groups).count()
}

/// Compute the total length of the packet whose header starts `buf`.
///
/// # Errors
/// See [Header::decode] and [Header::packet_len].
pub fn compute_packet_len(buf: &[u8]) -> Result<usize> {
    Header::decode(buf)?.packet_len()
}

/// A single binary output packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Packet {
    pub header: Header,
    /// All packet bytes, from the sync byte through the checksum
    pub data: Vec<u8>,
}

impl Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Packet{{groups: {:#04x}, data:[len={}]}}",
            self.header.groups,
            self.data.len()
        )
    }
}

impl Packet {
    /// Decode a packet from the start of `dat`. Bytes past the packet length are
    /// ignored.
    ///
    /// # Errors
    /// [Error::Truncated] if there are not enough bytes for the packet described
    /// by the header, otherwise any header error.
    pub fn decode(dat: &[u8]) -> Result<Packet> {
        let header = Header::decode(dat)?;
        let len = header.packet_len()?;
        if dat.len() < len {
            return Err(Error::Truncated {
                expected: len,
                actual: dat.len(),
            });
        }
        Ok(Packet {
            header,
            data: dat[..len].to_vec(),
        })
    }

    /// Read a single [Packet] using the default maximum packet length.
    ///
    /// # Errors
    /// See [Framer::read_packet].
    pub fn read<R: Read>(reader: R) -> Result<Packet> {
        Framer::default().read_packet(reader)
    }

    /// Payload bytes between the header and the checksum.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.data[self.header.len()..self.data.len() - CRC_LEN]
    }

    /// Checksum trailer as stored in the packet.
    #[must_use]
    pub fn stored_checksum(&self) -> u16 {
        let n = self.data.len();
        u16::from_be_bytes([self.data[n - 2], self.data[n - 1]])
    }

    /// Checksum residue over every byte but the sync byte. Zero for a valid
    /// packet.
    #[must_use]
    pub fn checksum_residue(&self) -> u16 {
        checksum(&self.data[1..])
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        checksum::is_valid(&self.data[1..])
    }

    /// # Errors
    /// [Error::ChecksumMismatch] if the checksum residue is not zero.
    pub fn validate(&self) -> Result<()> {
        let computed = self.checksum_residue();
        if computed != 0 {
            return Err(Error::ChecksumMismatch {
                computed,
                stored: self.stored_checksum(),
            });
        }
        Ok(())
    }
}

/// Reads packets from a byte stream positioned at a packet boundary.
#[derive(Debug, Clone)]
pub struct Framer {
    max_len: usize,
}

impl Default for Framer {
    fn default() -> Self {
        Self {
            max_len: MAX_PACKET_LEN,
        }
    }
}

impl Framer {
    /// Set the largest packet length accepted before reading the packet body.
    #[must_use]
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Read one packet: the fixed prefix, then the field words, then the rest of
    /// the packet as computed from the header. The body is read exactly once.
    ///
    /// # Errors
    /// [Error::Truncated] if the stream ends early, [Error::Framing] for an
    /// invalid header or a packet longer than the maximum, or [Error::Io].
    pub fn read_packet<R: Read>(&self, mut reader: R) -> Result<Packet> {
        let mut buf = vec![0u8; PREFIX_LEN];
        read_exact(&mut reader, &mut buf, 0)?;

        let groups = decode_prefix(buf[0], buf[1])?;
        let hdr_len = header_len(groups);
        buf.resize(hdr_len, 0);
        read_exact(&mut reader, &mut buf[PREFIX_LEN..], PREFIX_LEN)?;

        let header = Header::decode(&buf)?;
        let len = header.packet_len()?;
        trace!(groups = %format!("{groups:#04x}"), header_len = hdr_len, len, "framed header");
        if len > self.max_len {
            return Err(Error::framing(format!(
                "packet length {len} exceeds maximum {}",
                self.max_len
            )));
        }

        buf.resize(len, 0);
        read_exact(&mut reader, &mut buf[hdr_len..], hdr_len)?;
        debug!(len, "read packet");

        Ok(Packet { header, data: buf })
    }
}

/// `read_exact` that reports how many bytes of the packet were available
/// before the stream ended. `offset` is the number of bytes already read.
fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], offset: usize) -> Result<()> {
    let mut got = 0;
    while got < buf.len() {
        match reader.read(&mut buf[got..]) {
            Ok(0) => {
                return Err(Error::Truncated {
                    expected: offset + buf.len(),
                    actual: offset + got,
                })
            }
            Ok(n) => got += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
