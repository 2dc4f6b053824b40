//! Binary frame encoding
//!
//! [`FrameBuilder`] lays out fields the way the sensor does: field words in
//! group order, payload in group then bit order, CRC appended. It is used to
//! produce captures for offline tools and to exercise the decoder.

use std::collections::BTreeMap;

use crate::checksum::append_crc;
use crate::groups::{AttitudeField, BinaryGroup, CommonField, InsField, TimeField, SYNC_BYTE};
use crate::ins_status::InsStatus;
use crate::time::{tow_nanos, UtcTime};

/// Incremental builder for one binary frame
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    // keyed by (wire position of the group, field bit)
    fields: BTreeMap<(usize, u8), (BinaryGroup, Vec<u8>)>,
}

fn f32s(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn f64s(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bit_of(flag: u16) -> u8 {
    flag.trailing_zeros() as u8
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place arbitrary field bytes at `group`/`bit`.
    ///
    /// The caller is responsible for supplying the size the layout expects.
    pub fn raw_field(mut self, group: BinaryGroup, bit: u8, bytes: Vec<u8>) -> Self {
        let position = BinaryGroup::WIRE_ORDER
            .iter()
            .position(|g| *g == group)
            .unwrap_or(BinaryGroup::WIRE_ORDER.len());
        self.fields.insert((position, bit), (group, bytes));
        self
    }

    fn common(self, field: CommonField, bytes: Vec<u8>) -> Self {
        self.raw_field(BinaryGroup::COMMON, bit_of(field.bits()), bytes)
    }

    fn ins(self, field: InsField, bytes: Vec<u8>) -> Self {
        self.raw_field(BinaryGroup::INS, bit_of(field.bits()), bytes)
    }

    /// Yaw, pitch, roll in degrees (Common group)
    pub fn yaw_pitch_roll(self, ypr: [f32; 3]) -> Self {
        self.common(CommonField::YAW_PITCH_ROLL, f32s(&ypr))
    }

    /// Quaternion (x, y, z, w) (Common group)
    pub fn quaternion(self, q: [f32; 4]) -> Self {
        self.common(CommonField::QUATERNION, f32s(&q))
    }

    /// Angular rate in rad/s (Common group)
    pub fn angular_rate(self, rate: [f32; 3]) -> Self {
        self.common(CommonField::ANGULAR_RATE, f32s(&rate))
    }

    /// Acceleration in m/s² (Common group)
    pub fn acceleration(self, accel: [f32; 3]) -> Self {
        self.common(CommonField::ACCEL, f32s(&accel))
    }

    /// Latitude, longitude in degrees and altitude in m (Common group)
    pub fn position_lla(self, lla: [f64; 3]) -> Self {
        self.common(CommonField::POSITION, f64s(&lla))
    }

    /// Magnetic field, temperature and pressure (Common group MagPres)
    pub fn mag_pres(self, mag: [f32; 3], temperature: f32, pressure: f32) -> Self {
        let mut bytes = f32s(&mag);
        bytes.extend(f32s(&[temperature, pressure]));
        self.common(CommonField::MAG_PRES, bytes)
    }

    /// INS status word (INS group)
    pub fn ins_status(self, status: InsStatus) -> Self {
        self.ins(InsField::INS_STATUS, status.bits().to_le_bytes().to_vec())
    }

    /// ECEF position in m (INS group)
    pub fn position_ecef(self, ecef: [f64; 3]) -> Self {
        self.ins(InsField::POS_ECEF, f64s(&ecef))
    }

    /// Body-frame velocity in m/s (INS group)
    pub fn velocity_body(self, vel: [f32; 3]) -> Self {
        self.ins(InsField::VEL_BODY, f32s(&vel))
    }

    /// NED velocity in m/s (INS group)
    pub fn velocity_ned(self, vel: [f32; 3]) -> Self {
        self.ins(InsField::VEL_NED, f32s(&vel))
    }

    /// Position 1-sigma in m (INS group)
    pub fn position_uncertainty(self, sigma_m: f32) -> Self {
        self.ins(InsField::POS_U, sigma_m.to_le_bytes().to_vec())
    }

    /// Velocity 1-sigma in m/s (INS group)
    pub fn velocity_uncertainty(self, sigma_mps: f32) -> Self {
        self.ins(InsField::VEL_U, sigma_mps.to_le_bytes().to_vec())
    }

    /// Yaw, pitch, roll 1-sigma in degrees (Attitude group YprU)
    pub fn attitude_uncertainty(self, sigma_deg: [f32; 3]) -> Self {
        self.raw_field(
            BinaryGroup::ATTITUDE,
            bit_of(AttitudeField::YPR_U.bits()),
            f32s(&sigma_deg),
        )
    }

    /// GPS time of week in seconds (Time group)
    pub fn time_of_week(self, seconds: f64) -> Self {
        self.raw_field(
            BinaryGroup::TIME,
            bit_of(TimeField::GPS_TOW.bits()),
            tow_nanos(seconds).to_le_bytes().to_vec(),
        )
    }

    /// GPS week number (Time group)
    pub fn gps_week(self, week: u16) -> Self {
        self.raw_field(
            BinaryGroup::TIME,
            bit_of(TimeField::GPS_WEEK.bits()),
            week.to_le_bytes().to_vec(),
        )
    }

    /// UTC time (Time group)
    pub fn time_utc(self, utc: UtcTime) -> Self {
        self.raw_field(
            BinaryGroup::TIME,
            bit_of(TimeField::TIME_UTC.bits()),
            utc.to_bytes().to_vec(),
        )
    }

    /// Serialize the frame, sync byte through CRC.
    pub fn build(&self) -> Vec<u8> {
        let mut groups = BinaryGroup::empty();
        let mut words: Vec<(BinaryGroup, u16)> = Vec::new();
        let mut payload = Vec::new();

        for (&(_, bit), (group, bytes)) in &self.fields {
            groups |= *group;
            match words.last_mut() {
                Some((last, word)) if *last == *group => *word |= 1 << bit,
                _ => words.push((*group, 1 << bit)),
            }
            payload.extend_from_slice(bytes);
        }

        let mut frame = Vec::with_capacity(2 + 2 * words.len() + payload.len() + 2);
        frame.push(SYNC_BYTE);
        frame.push(groups.bits());
        for (_, word) in &words {
            frame.extend_from_slice(&word.to_le_bytes());
        }
        frame.extend_from_slice(&payload);
        append_crc(&mut frame);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::verify_crc;

    #[test]
    fn test_minimal_frame_layout() {
        let frame = FrameBuilder::new().yaw_pitch_roll([1.0, 2.0, 3.0]).build();
        assert_eq!(frame[0], SYNC_BYTE);
        assert_eq!(frame[1], BinaryGroup::COMMON.bits());
        assert_eq!(
            u16::from_le_bytes([frame[2], frame[3]]),
            CommonField::YAW_PITCH_ROLL.bits()
        );
        assert_eq!(frame.len(), 4 + 12 + 2);
        assert!(verify_crc(&frame));
    }

    #[test]
    fn test_groups_emitted_in_wire_order() {
        // INS field added first must still follow the Time group on the wire
        let frame = FrameBuilder::new()
            .position_ecef([1.0, 2.0, 3.0])
            .gps_week(2100)
            .build();
        assert_eq!(frame[1], (BinaryGroup::TIME | BinaryGroup::INS).bits());
        assert_eq!(
            u16::from_le_bytes([frame[2], frame[3]]),
            TimeField::GPS_WEEK.bits()
        );
        assert_eq!(
            u16::from_le_bytes([frame[4], frame[5]]),
            InsField::POS_ECEF.bits()
        );
        // week payload comes before the ECEF payload
        assert_eq!(u16::from_le_bytes([frame[6], frame[7]]), 2100);
    }

    #[test]
    fn test_fields_within_group_sorted_by_bit() {
        let frame = FrameBuilder::new()
            .acceleration([0.0, 0.0, -9.8])
            .yaw_pitch_roll([4.0, 5.0, 6.0])
            .build();
        let word = u16::from_le_bytes([frame[2], frame[3]]);
        assert_eq!(
            word,
            (CommonField::YAW_PITCH_ROLL | CommonField::ACCEL).bits()
        );
        let yaw = f32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]);
        assert_eq!(yaw, 4.0);
    }
}
