//! Checksums used on the VectorNav serial link
//!
//! Binary frames end with a CRC-16/XMODEM (polynomial 0x1021, initial value
//! zero) computed over every byte after the sync byte and sent MSB first.
//! Running the same CRC over the frame including its trailing CRC yields
//! zero for an intact frame.
//!
//! ASCII register commands carry an 8-bit XOR of the characters between the
//! leading `$` and the `*`, written as two hex digits.

use crc::{Crc, CRC_16_XMODEM};

use crate::groups::{CRC_LEN, SYNC_BYTE};

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Compute the binary frame CRC over `data`.
pub fn compute_crc(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Verify the CRC of a complete binary frame, sync byte included.
pub fn verify_crc(frame: &[u8]) -> bool {
    if frame.len() < 2 + CRC_LEN || frame[0] != SYNC_BYTE {
        return false;
    }
    compute_crc(&frame[1..]) == 0
}

/// Append the big-endian CRC of everything after the sync byte.
///
/// An empty buffer has no sync byte to skip and is left untouched.
pub fn append_crc(frame: &mut Vec<u8>) {
    let Some(body) = frame.get(1..) else {
        return;
    };
    let crc = compute_crc(body);
    frame.extend_from_slice(&crc.to_be_bytes());
}

/// XOR checksum of an ASCII command body (the text between `$` and `*`).
pub fn ascii_checksum(body: &str) -> u8 {
    body.bytes().fold(0u8, |acc, b| acc ^ b)
}
