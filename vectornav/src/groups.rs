//! Binary output group and field layout
//!
//! A binary frame announces which output groups it carries with one byte of
//! group flags, followed by one 16-bit field word per selected group. Payload
//! fields then appear in group order and, within a group, in ascending bit
//! order. Every field has a fixed size, so the frame length is fully
//! determined by the header.

use bitflags::bitflags;

/// Sync byte that starts every binary frame
pub const SYNC_BYTE: u8 = 0xFA;

/// Set in a group field word when an extension word follows
pub const EXTENSION_BIT: u16 = 0x8000;

/// Bytes occupied by the trailing CRC
pub const CRC_LEN: usize = 2;

bitflags! {
    /// Output groups selectable in a binary output register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct BinaryGroup: u8 {
        const COMMON = 0x01;
        const TIME = 0x02;
        const IMU = 0x04;
        const GPS = 0x08;
        const ATTITUDE = 0x10;
        const INS = 0x20;
        const GPS2 = 0x40;
    }
}

bitflags! {
    /// Fields of the Common group
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommonField: u16 {
        const TIME_STARTUP = 1 << 0;
        const TIME_GPS = 1 << 1;
        const TIME_SYNC_IN = 1 << 2;
        const YAW_PITCH_ROLL = 1 << 3;
        const QUATERNION = 1 << 4;
        const ANGULAR_RATE = 1 << 5;
        const POSITION = 1 << 6;
        const VELOCITY = 1 << 7;
        const ACCEL = 1 << 8;
        const IMU = 1 << 9;
        const MAG_PRES = 1 << 10;
        const DELTA_THETA = 1 << 11;
        const INS_STATUS = 1 << 12;
        const SYNC_IN_CNT = 1 << 13;
        const TIME_GPS_PPS = 1 << 14;
    }
}

bitflags! {
    /// Fields of the Time group
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TimeField: u16 {
        const TIME_STARTUP = 1 << 0;
        const TIME_GPS = 1 << 1;
        const GPS_TOW = 1 << 2;
        const GPS_WEEK = 1 << 3;
        const TIME_SYNC_IN = 1 << 4;
        const TIME_GPS_PPS = 1 << 5;
        const TIME_UTC = 1 << 6;
        const SYNC_IN_CNT = 1 << 7;
        const SYNC_OUT_CNT = 1 << 8;
        const TIME_STATUS = 1 << 9;
    }
}

bitflags! {
    /// Fields of the IMU group
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImuField: u16 {
        const IMU_STATUS = 1 << 0;
        const UNCOMP_MAG = 1 << 1;
        const UNCOMP_ACCEL = 1 << 2;
        const UNCOMP_GYRO = 1 << 3;
        const TEMP = 1 << 4;
        const PRES = 1 << 5;
        const DELTA_THETA = 1 << 6;
        const DELTA_VEL = 1 << 7;
        const MAG = 1 << 8;
        const ACCEL = 1 << 9;
        const ANGULAR_RATE = 1 << 10;
        const SENS_SAT = 1 << 11;
    }
}

bitflags! {
    /// Fields of the GPS and GPS2 groups
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GpsField: u16 {
        const UTC = 1 << 0;
        const TOW = 1 << 1;
        const WEEK = 1 << 2;
        const NUM_SATS = 1 << 3;
        const FIX = 1 << 4;
        const POS_LLA = 1 << 5;
        const POS_ECEF = 1 << 6;
        const VEL_NED = 1 << 7;
        const VEL_ECEF = 1 << 8;
        const POS_U = 1 << 9;
        const VEL_U = 1 << 10;
        const TIME_U = 1 << 11;
        const TIME_INFO = 1 << 12;
        const DOP = 1 << 13;
    }
}

bitflags! {
    /// Fields of the Attitude group
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttitudeField: u16 {
        const VPE_STATUS = 1 << 0;
        const YAW_PITCH_ROLL = 1 << 1;
        const QUATERNION = 1 << 2;
        const DCM = 1 << 3;
        const MAG_NED = 1 << 4;
        const ACCEL_NED = 1 << 5;
        const LINEAR_ACCEL_BODY = 1 << 6;
        const LINEAR_ACCEL_NED = 1 << 7;
        const YPR_U = 1 << 8;
        const HEAVE = 1 << 12;
    }
}

bitflags! {
    /// Fields of the INS group
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InsField: u16 {
        const INS_STATUS = 1 << 0;
        const POS_LLA = 1 << 1;
        const POS_ECEF = 1 << 2;
        const VEL_BODY = 1 << 3;
        const VEL_NED = 1 << 4;
        const VEL_ECEF = 1 << 5;
        const MAG_ECEF = 1 << 6;
        const ACCEL_ECEF = 1 << 7;
        const LINEAR_ACCEL_ECEF = 1 << 8;
        const POS_U = 1 << 9;
        const VEL_U = 1 << 10;
    }
}

const COMMON_SIZES: [Option<usize>; 15] = [
    Some(8),
    Some(8),
    Some(8),
    Some(12),
    Some(16),
    Some(12),
    Some(24),
    Some(12),
    Some(12),
    Some(24),
    Some(20),
    Some(28),
    Some(2),
    Some(4),
    Some(8),
];

const TIME_SIZES: [Option<usize>; 15] = [
    Some(8),
    Some(8),
    Some(8),
    Some(2),
    Some(8),
    Some(8),
    Some(8),
    Some(4),
    Some(4),
    Some(1),
    None,
    None,
    None,
    None,
    None,
];

const IMU_SIZES: [Option<usize>; 15] = [
    Some(2),
    Some(12),
    Some(12),
    Some(12),
    Some(4),
    Some(4),
    Some(16),
    Some(12),
    Some(12),
    Some(12),
    Some(12),
    Some(2),
    None,
    None,
    None,
];

const GPS_SIZES: [Option<usize>; 15] = [
    Some(8),
    Some(8),
    Some(2),
    Some(1),
    Some(1),
    Some(24),
    Some(24),
    Some(12),
    Some(12),
    Some(12),
    Some(4),
    Some(4),
    Some(2),
    Some(28),
    None,
];

const ATTITUDE_SIZES: [Option<usize>; 15] = [
    Some(2),
    Some(12),
    Some(16),
    Some(36),
    Some(12),
    Some(12),
    Some(12),
    Some(12),
    Some(12),
    None,
    None,
    None,
    Some(24),
    None,
    None,
];

const INS_SIZES: [Option<usize>; 15] = [
    Some(2),
    Some(24),
    Some(24),
    Some(12),
    Some(12),
    Some(12),
    Some(12),
    Some(12),
    Some(12),
    Some(4),
    Some(4),
    None,
    None,
    None,
    None,
];

impl BinaryGroup {
    /// Groups in the order their field words and payloads appear on the wire
    pub const WIRE_ORDER: [BinaryGroup; 7] = [
        BinaryGroup::COMMON,
        BinaryGroup::TIME,
        BinaryGroup::IMU,
        BinaryGroup::GPS,
        BinaryGroup::ATTITUDE,
        BinaryGroup::INS,
        BinaryGroup::GPS2,
    ];

    /// Short name for log and error messages
    pub fn name(self) -> &'static str {
        match self {
            g if g == BinaryGroup::COMMON => "common",
            g if g == BinaryGroup::TIME => "time",
            g if g == BinaryGroup::IMU => "imu",
            g if g == BinaryGroup::GPS => "gps",
            g if g == BinaryGroup::ATTITUDE => "attitude",
            g if g == BinaryGroup::INS => "ins",
            g if g == BinaryGroup::GPS2 => "gps2",
            _ => "mixed",
        }
    }

    fn size_table(self) -> Option<&'static [Option<usize>; 15]> {
        match self {
            g if g == BinaryGroup::COMMON => Some(&COMMON_SIZES),
            g if g == BinaryGroup::TIME => Some(&TIME_SIZES),
            g if g == BinaryGroup::IMU => Some(&IMU_SIZES),
            g if g == BinaryGroup::GPS || g == BinaryGroup::GPS2 => Some(&GPS_SIZES),
            g if g == BinaryGroup::ATTITUDE => Some(&ATTITUDE_SIZES),
            g if g == BinaryGroup::INS => Some(&INS_SIZES),
            _ => None,
        }
    }

    /// Size in bytes of field `bit` of this (single) group.
    ///
    /// Returns `None` for reserved bits, the extension bit, or when `self`
    /// is not exactly one group.
    pub fn field_size(self, bit: u8) -> Option<usize> {
        self.size_table()?.get(bit as usize).copied().flatten()
    }

    /// Payload size of all fields selected in `fields`, or the first bit
    /// with no known size.
    pub fn payload_size(self, fields: u16) -> Result<usize, u8> {
        set_bits(fields).try_fold(0usize, |acc, bit| {
            self.field_size(bit).map(|size| acc + size).ok_or(bit)
        })
    }
}

/// Iterate the indices of the set bits of `word`, lowest first
pub fn set_bits(word: u16) -> impl Iterator<Item = u8> {
    (0u8..16).filter(move |bit| word & (1 << bit) != 0)
}
