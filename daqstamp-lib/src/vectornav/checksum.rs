//! 16-bit packet checksum.
//!
//! The algorithm is CRC-16/XMODEM (polynomial 0x1021, zero initial value).
//! Running it over a message followed by its big-endian checksum yields zero.
use crc::{Crc, CRC_16_XMODEM};

const VN_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Checksum of `dat`.
#[must_use]
pub fn checksum(dat: &[u8]) -> u16 {
    VN_CRC.checksum(dat)
}

/// Trailer bytes to append to `dat` so that the checksum of the whole is zero.
#[must_use]
pub fn checksum_trailer(dat: &[u8]) -> [u8; 2] {
    checksum(dat).to_be_bytes()
}

/// True if `dat`, including its trailing checksum, has a zero residue.
#[must_use]
pub fn is_valid(dat: &[u8]) -> bool {
    checksum(dat) == 0
}
