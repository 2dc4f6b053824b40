//! Time fields carried in the Time and GPS groups
//!
//! GPS time of week arrives as integer nanoseconds; UTC time as an 8-byte
//! broken-down calendar record with a two-digit year.

use bytes::Buf;

const NANOS_PER_SECOND: f64 = 1.0e9;

/// Convert a GPS time-of-week field (nanoseconds) to seconds
pub fn tow_seconds(tow_ns: u64) -> f64 {
    tow_ns as f64 / NANOS_PER_SECOND
}

/// Convert seconds of week back to the nanosecond wire representation
pub fn tow_nanos(tow_s: f64) -> u64 {
    (tow_s * NANOS_PER_SECOND).round() as u64
}

/// Broken-down UTC time as reported by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UtcTime {
    /// Years since 2000
    pub year: i8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
}

impl UtcTime {
    /// Wire size in bytes
    pub const SIZE: usize = 8;

    /// Decode from the 8-byte little-endian wire layout
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        let mut buf = &bytes[..];
        Self {
            year: buf.get_i8(),
            month: buf.get_u8(),
            day: buf.get_u8(),
            hour: buf.get_u8(),
            minute: buf.get_u8(),
            second: buf.get_u8(),
            millisecond: buf.get_u16_le(),
        }
    }

    /// Encode to the 8-byte wire layout
    pub fn to_bytes(&self) -> [u8; 8] {
        let ms = self.millisecond.to_le_bytes();
        [
            self.year as u8,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            ms[0],
            ms[1],
        ]
    }

    /// Full calendar year
    pub fn full_year(&self) -> i32 {
        2000 + self.year as i32
    }
}
