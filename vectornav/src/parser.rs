//! Binary frame decoding
//!
//! [`parse`] turns one complete binary frame (sync byte through CRC) into a
//! [`CompositeData`]. A frame either decodes completely or is rejected with
//! a [`ParseError`]; there is no partial result.

use bytes::Buf;
use thiserror::Error;
use tracing::trace;

use crate::checksum::verify_crc;
use crate::composite::CompositeData;
use crate::device::DeviceFamily;
use crate::groups::{
    set_bits, AttitudeField, BinaryGroup, CommonField, GpsField, ImuField, InsField, TimeField,
    CRC_LEN, EXTENSION_BIT, SYNC_BYTE,
};
use crate::ins_status::InsStatus;
use crate::time::{tow_seconds, UtcTime};

/// Errors from decoding a binary frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Not enough bytes yet; `needed` is the minimum total length known so far
    #[error("frame too short: have {actual} bytes, need {needed}")]
    TooShort { needed: usize, actual: usize },

    #[error("expected sync byte 0xFA, found {0:#04x}")]
    BadSync(u8),

    #[error("frame selects no output groups")]
    NoGroups,

    #[error("{group} group uses an extension word, which is not supported")]
    UnsupportedExtension { group: &'static str },

    #[error("{group} group field bit {bit} is reserved or unknown")]
    UnknownField { group: &'static str, bit: u8 },

    #[error("frame is {actual} bytes but its header describes {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("CRC check failed")]
    CrcMismatch,
}

/// Group selection and sizes read from the start of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// Selected groups with their field words, in wire order
    pub fields: Vec<(BinaryGroup, u16)>,
    /// Total payload bytes
    pub payload_len: usize,
}

impl FrameHeader {
    /// Read the header from the start of `bytes`.
    ///
    /// Only the sync byte, group byte and field words are required; the
    /// payload does not need to be present yet.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() < 2 {
            return Err(ParseError::TooShort {
                needed: 2,
                actual: bytes.len(),
            });
        }
        if bytes[0] != SYNC_BYTE {
            return Err(ParseError::BadSync(bytes[0]));
        }

        let groups = BinaryGroup::from_bits_retain(bytes[1]);
        if groups.is_empty() {
            return Err(ParseError::NoGroups);
        }
        if !BinaryGroup::all().contains(groups) {
            // bit 7 of the group byte would announce a second group byte
            return Err(ParseError::UnsupportedExtension { group: "groups" });
        }

        let selected: Vec<BinaryGroup> = BinaryGroup::WIRE_ORDER
            .into_iter()
            .filter(|g| groups.contains(*g))
            .collect();
        let header_len = 2 + 2 * selected.len();
        if bytes.len() < header_len {
            return Err(ParseError::TooShort {
                needed: header_len,
                actual: bytes.len(),
            });
        }

        let mut words = &bytes[2..header_len];
        let mut fields = Vec::with_capacity(selected.len());
        let mut payload_len = 0;
        for group in selected {
            let word = words.get_u16_le();
            if word & EXTENSION_BIT != 0 {
                return Err(ParseError::UnsupportedExtension { group: group.name() });
            }
            payload_len += group
                .payload_size(word)
                .map_err(|bit| ParseError::UnknownField {
                    group: group.name(),
                    bit,
                })?;
            fields.push((group, word));
        }

        Ok(Self {
            fields,
            payload_len,
        })
    }

    /// Bytes from the sync byte to the first payload byte
    pub fn header_len(&self) -> usize {
        2 + 2 * self.fields.len()
    }

    /// Total frame length including sync byte and CRC
    pub fn frame_len(&self) -> usize {
        self.header_len() + self.payload_len + CRC_LEN
    }
}

/// Decode one complete binary frame.
///
/// `family` gates the INS solution: a VN-100 has no GNSS receiver, so any
/// position, velocity or INS status bytes it emits are skipped.
pub fn parse(frame: &[u8], family: DeviceFamily) -> Result<CompositeData, ParseError> {
    let header = FrameHeader::parse(frame)?;
    let expected = header.frame_len();
    if frame.len() < expected {
        return Err(ParseError::TooShort {
            needed: expected,
            actual: frame.len(),
        });
    }
    if frame.len() != expected {
        return Err(ParseError::LengthMismatch {
            expected,
            actual: frame.len(),
        });
    }
    if !verify_crc(frame) {
        return Err(ParseError::CrcMismatch);
    }

    let mut payload = &frame[header.header_len()..expected - CRC_LEN];
    let mut cd = CompositeData::new();
    for (group, word) in &header.fields {
        for bit in set_bits(*word) {
            // sizes were validated while reading the header
            let size = group.field_size(bit).unwrap_or(0);
            let (field, rest) = payload.split_at(size);
            payload = rest;
            cd = apply_field(cd, *group, bit, field, family.has_gnss());
        }
    }

    trace!("decoded frame with {:?}", cd.present_fields());
    Ok(cd)
}

fn read_vec3f(mut buf: &[u8]) -> [f32; 3] {
    [buf.get_f32_le(), buf.get_f32_le(), buf.get_f32_le()]
}

fn read_vec3d(mut buf: &[u8]) -> [f64; 3] {
    [buf.get_f64_le(), buf.get_f64_le(), buf.get_f64_le()]
}

fn read_quat(mut buf: &[u8]) -> [f32; 4] {
    [
        buf.get_f32_le(),
        buf.get_f32_le(),
        buf.get_f32_le(),
        buf.get_f32_le(),
    ]
}

fn read_utc(buf: &[u8]) -> UtcTime {
    let mut bytes = [0u8; UtcTime::SIZE];
    bytes.copy_from_slice(&buf[..UtcTime::SIZE]);
    UtcTime::from_bytes(bytes)
}

fn apply_field(
    cd: CompositeData,
    group: BinaryGroup,
    bit: u8,
    mut buf: &[u8],
    gnss: bool,
) -> CompositeData {
    let flag = 1u16 << bit;
    match group {
        g if g == BinaryGroup::COMMON => match CommonField::from_bits_retain(flag) {
            f if f == CommonField::YAW_PITCH_ROLL => cd.with_yaw_pitch_roll(read_vec3f(buf)),
            f if f == CommonField::QUATERNION => cd.with_quaternion(read_quat(buf)),
            f if f == CommonField::ANGULAR_RATE => cd.with_angular_rate(read_vec3f(buf)),
            f if f == CommonField::ACCEL => cd.with_acceleration(read_vec3f(buf)),
            f if f == CommonField::MAG_PRES => {
                let mag = read_vec3f(buf);
                buf.advance(12);
                let temp = buf.get_f32_le();
                let pres = buf.get_f32_le();
                cd.with_magnetic_field(mag)
                    .with_temperature(temp)
                    .with_pressure(pres)
            }
            f if f == CommonField::POSITION && gnss => cd.with_position_lla(read_vec3d(buf)),
            f if f == CommonField::VELOCITY && gnss => cd.with_velocity_ned(read_vec3f(buf)),
            f if f == CommonField::INS_STATUS && gnss => {
                cd.with_ins_status(InsStatus::from_raw(buf.get_u16_le()))
            }
            _ => skip(cd, group, bit),
        },
        g if g == BinaryGroup::TIME => match TimeField::from_bits_retain(flag) {
            f if f == TimeField::GPS_TOW => cd.with_time_of_week(tow_seconds(buf.get_u64_le())),
            f if f == TimeField::GPS_WEEK => cd.with_gps_week(buf.get_u16_le()),
            f if f == TimeField::TIME_UTC => cd.with_time_utc(read_utc(buf)),
            _ => skip(cd, group, bit),
        },
        g if g == BinaryGroup::IMU => match ImuField::from_bits_retain(flag) {
            f if f == ImuField::TEMP => cd.with_temperature(buf.get_f32_le()),
            f if f == ImuField::PRES => cd.with_pressure(buf.get_f32_le()),
            f if f == ImuField::MAG => cd.with_magnetic_field(read_vec3f(buf)),
            f if f == ImuField::ACCEL => cd.with_acceleration(read_vec3f(buf)),
            f if f == ImuField::ANGULAR_RATE => cd.with_angular_rate(read_vec3f(buf)),
            _ => skip(cd, group, bit),
        },
        g if g == BinaryGroup::GPS => match GpsField::from_bits_retain(flag) {
            f if f == GpsField::UTC => cd.with_time_utc(read_utc(buf)),
            f if f == GpsField::TOW => cd.with_time_of_week(tow_seconds(buf.get_u64_le())),
            f if f == GpsField::WEEK => cd.with_gps_week(buf.get_u16_le()),
            _ => skip(cd, group, bit),
        },
        g if g == BinaryGroup::ATTITUDE => match AttitudeField::from_bits_retain(flag) {
            f if f == AttitudeField::YAW_PITCH_ROLL => cd.with_yaw_pitch_roll(read_vec3f(buf)),
            f if f == AttitudeField::QUATERNION => cd.with_quaternion(read_quat(buf)),
            f if f == AttitudeField::YPR_U => cd.with_attitude_uncertainty(read_vec3f(buf)),
            _ => skip(cd, group, bit),
        },
        g if g == BinaryGroup::INS && gnss => match InsField::from_bits_retain(flag) {
            f if f == InsField::INS_STATUS => {
                cd.with_ins_status(InsStatus::from_raw(buf.get_u16_le()))
            }
            f if f == InsField::POS_LLA => cd.with_position_lla(read_vec3d(buf)),
            f if f == InsField::POS_ECEF => cd.with_position_ecef(read_vec3d(buf)),
            f if f == InsField::VEL_BODY => cd.with_velocity_body(read_vec3f(buf)),
            f if f == InsField::VEL_NED => cd.with_velocity_ned(read_vec3f(buf)),
            f if f == InsField::POS_U => cd.with_position_uncertainty(buf.get_f32_le()),
            f if f == InsField::VEL_U => cd.with_velocity_uncertainty(buf.get_f32_le()),
            _ => skip(cd, group, bit),
        },
        _ => skip(cd, group, bit),
    }
}

fn skip(cd: CompositeData, group: BinaryGroup, bit: u8) -> CompositeData {
    trace!("skipping {} field bit {}", group.name(), bit);
    cd
}
