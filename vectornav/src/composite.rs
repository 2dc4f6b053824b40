//! Decoded packet snapshot with per-field presence
//!
//! A [`CompositeData`] holds whatever quantities one binary frame carried.
//! No field is guaranteed: each accessor returns `Option` and every consumer
//! has to handle absence. Values are set through the consuming `with_*`
//! methods while a frame is decoded and are read-only afterwards.

use strum::{Display, EnumIter, IntoEnumIterator};

use crate::ins_status::InsStatus;
use crate::time::UtcTime;

/// Kinds of quantity a frame can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum FieldKind {
    YawPitchRoll,
    Quaternion,
    AngularRate,
    Acceleration,
    MagneticField,
    Temperature,
    Pressure,
    PositionLla,
    PositionEcef,
    VelocityBody,
    VelocityNed,
    AttitudeUncertainty,
    PositionUncertainty,
    VelocityUncertainty,
    InsStatus,
    TimeOfWeek,
    GpsWeek,
    TimeUtc,
}

/// One decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompositeData {
    yaw_pitch_roll: Option<[f32; 3]>,
    quaternion: Option<[f32; 4]>,
    angular_rate: Option<[f32; 3]>,
    acceleration: Option<[f32; 3]>,
    magnetic_field: Option<[f32; 3]>,
    temperature: Option<f32>,
    pressure: Option<f32>,
    position_lla: Option<[f64; 3]>,
    position_ecef: Option<[f64; 3]>,
    velocity_body: Option<[f32; 3]>,
    velocity_ned: Option<[f32; 3]>,
    attitude_uncertainty: Option<[f32; 3]>,
    position_uncertainty: Option<f32>,
    velocity_uncertainty: Option<f32>,
    ins_status: Option<InsStatus>,
    time_of_week: Option<f64>,
    gps_week: Option<u16>,
    time_utc: Option<UtcTime>,
}

impl CompositeData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yaw, pitch, roll in degrees (native field order)
    pub fn yaw_pitch_roll(&self) -> Option<[f32; 3]> {
        self.yaw_pitch_roll
    }

    /// Attitude quaternion as (x, y, z, w), body relative to NED
    pub fn quaternion(&self) -> Option<[f32; 4]> {
        self.quaternion
    }

    /// Body angular rate in rad/s
    pub fn angular_rate(&self) -> Option<[f32; 3]> {
        self.angular_rate
    }

    /// Body acceleration in m/s²
    pub fn acceleration(&self) -> Option<[f32; 3]> {
        self.acceleration
    }

    /// Compensated magnetic field in gauss
    pub fn magnetic_field(&self) -> Option<[f32; 3]> {
        self.magnetic_field
    }

    /// IMU temperature in °C
    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// Barometric pressure in kPa
    pub fn pressure(&self) -> Option<f32> {
        self.pressure
    }

    /// Estimated latitude (deg), longitude (deg), altitude (m)
    pub fn position_lla(&self) -> Option<[f64; 3]> {
        self.position_lla
    }

    /// Estimated ECEF position in m
    pub fn position_ecef(&self) -> Option<[f64; 3]> {
        self.position_ecef
    }

    /// Estimated body-frame velocity in m/s
    pub fn velocity_body(&self) -> Option<[f32; 3]> {
        self.velocity_body
    }

    /// Estimated NED velocity in m/s
    pub fn velocity_ned(&self) -> Option<[f32; 3]> {
        self.velocity_ned
    }

    /// 1-sigma yaw, pitch, roll uncertainty in degrees
    pub fn attitude_uncertainty(&self) -> Option<[f32; 3]> {
        self.attitude_uncertainty
    }

    /// 1-sigma position uncertainty in m
    pub fn position_uncertainty(&self) -> Option<f32> {
        self.position_uncertainty
    }

    /// 1-sigma velocity uncertainty in m/s
    pub fn velocity_uncertainty(&self) -> Option<f32> {
        self.velocity_uncertainty
    }

    /// INS filter status word
    pub fn ins_status(&self) -> Option<InsStatus> {
        self.ins_status
    }

    /// GPS time of week in seconds
    pub fn time_of_week(&self) -> Option<f64> {
        self.time_of_week
    }

    /// GPS week number
    pub fn gps_week(&self) -> Option<u16> {
        self.gps_week
    }

    /// UTC time reported by the sensor
    pub fn time_utc(&self) -> Option<UtcTime> {
        self.time_utc
    }

    /// Set yaw, pitch, roll in degrees
    pub fn with_yaw_pitch_roll(mut self, ypr: [f32; 3]) -> Self {
        self.yaw_pitch_roll = Some(ypr);
        self
    }

    /// Set the attitude quaternion (x, y, z, w)
    pub fn with_quaternion(mut self, q: [f32; 4]) -> Self {
        self.quaternion = Some(q);
        self
    }

    /// Set the body angular rate in rad/s
    pub fn with_angular_rate(mut self, rate: [f32; 3]) -> Self {
        self.angular_rate = Some(rate);
        self
    }

    /// Set the body acceleration in m/s²
    pub fn with_acceleration(mut self, accel: [f32; 3]) -> Self {
        self.acceleration = Some(accel);
        self
    }

    /// Set the magnetic field in gauss
    pub fn with_magnetic_field(mut self, mag: [f32; 3]) -> Self {
        self.magnetic_field = Some(mag);
        self
    }

    /// Set the IMU temperature in °C
    pub fn with_temperature(mut self, celsius: f32) -> Self {
        self.temperature = Some(celsius);
        self
    }

    /// Set the barometric pressure in kPa
    pub fn with_pressure(mut self, kpa: f32) -> Self {
        self.pressure = Some(kpa);
        self
    }

    /// Set latitude, longitude (deg) and altitude (m)
    pub fn with_position_lla(mut self, lla: [f64; 3]) -> Self {
        self.position_lla = Some(lla);
        self
    }

    /// Set the ECEF position in m
    pub fn with_position_ecef(mut self, ecef: [f64; 3]) -> Self {
        self.position_ecef = Some(ecef);
        self
    }

    /// Set the body-frame velocity in m/s
    pub fn with_velocity_body(mut self, vel: [f32; 3]) -> Self {
        self.velocity_body = Some(vel);
        self
    }

    /// Set the NED velocity in m/s
    pub fn with_velocity_ned(mut self, vel: [f32; 3]) -> Self {
        self.velocity_ned = Some(vel);
        self
    }

    /// Set the yaw, pitch, roll 1-sigma in degrees
    pub fn with_attitude_uncertainty(mut self, sigma_deg: [f32; 3]) -> Self {
        self.attitude_uncertainty = Some(sigma_deg);
        self
    }

    /// Set the position 1-sigma in m
    pub fn with_position_uncertainty(mut self, sigma_m: f32) -> Self {
        self.position_uncertainty = Some(sigma_m);
        self
    }

    /// Set the velocity 1-sigma in m/s
    pub fn with_velocity_uncertainty(mut self, sigma_mps: f32) -> Self {
        self.velocity_uncertainty = Some(sigma_mps);
        self
    }

    /// Set the INS status word
    pub fn with_ins_status(mut self, status: InsStatus) -> Self {
        self.ins_status = Some(status);
        self
    }

    /// Set the GPS time of week in seconds
    pub fn with_time_of_week(mut self, seconds: f64) -> Self {
        self.time_of_week = Some(seconds);
        self
    }

    /// Set the GPS week number
    pub fn with_gps_week(mut self, week: u16) -> Self {
        self.gps_week = Some(week);
        self
    }

    /// Set the UTC time
    pub fn with_time_utc(mut self, utc: UtcTime) -> Self {
        self.time_utc = Some(utc);
        self
    }

    /// Whether a field of the given kind is present
    pub fn has(&self, kind: FieldKind) -> bool {
        match kind {
            FieldKind::YawPitchRoll => self.yaw_pitch_roll.is_some(),
            FieldKind::Quaternion => self.quaternion.is_some(),
            FieldKind::AngularRate => self.angular_rate.is_some(),
            FieldKind::Acceleration => self.acceleration.is_some(),
            FieldKind::MagneticField => self.magnetic_field.is_some(),
            FieldKind::Temperature => self.temperature.is_some(),
            FieldKind::Pressure => self.pressure.is_some(),
            FieldKind::PositionLla => self.position_lla.is_some(),
            FieldKind::PositionEcef => self.position_ecef.is_some(),
            FieldKind::VelocityBody => self.velocity_body.is_some(),
            FieldKind::VelocityNed => self.velocity_ned.is_some(),
            FieldKind::AttitudeUncertainty => self.attitude_uncertainty.is_some(),
            FieldKind::PositionUncertainty => self.position_uncertainty.is_some(),
            FieldKind::VelocityUncertainty => self.velocity_uncertainty.is_some(),
            FieldKind::InsStatus => self.ins_status.is_some(),
            FieldKind::TimeOfWeek => self.time_of_week.is_some(),
            FieldKind::GpsWeek => self.gps_week.is_some(),
            FieldKind::TimeUtc => self.time_utc.is_some(),
        }
    }

    /// All field kinds present in this snapshot
    pub fn present_fields(&self) -> Vec<FieldKind> {
        FieldKind::iter().filter(|kind| self.has(*kind)).collect()
    }

    /// True when no field was decoded
    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_by_default() {
        let cd = CompositeData::new();
        assert!(cd.is_empty());
        assert!(cd.yaw_pitch_roll().is_none());
        assert!(cd.position_lla().is_none());
    }

    #[test]
    fn test_presence_tracks_setters() {
        let cd = CompositeData::new()
            .with_yaw_pitch_roll([10.0, 0.0, 0.0])
            .with_temperature(21.5);

        assert!(cd.has(FieldKind::YawPitchRoll));
        assert!(cd.has(FieldKind::Temperature));
        assert!(!cd.has(FieldKind::AngularRate));
        assert_eq!(
            cd.present_fields(),
            vec![FieldKind::YawPitchRoll, FieldKind::Temperature]
        );
    }

    #[test]
    fn test_later_value_replaces_earlier() {
        let cd = CompositeData::new()
            .with_acceleration([0.0, 0.0, -9.8])
            .with_acceleration([0.1, 0.2, -9.7]);
        assert_eq!(cd.acceleration(), Some([0.1, 0.2, -9.7]));
    }
}
