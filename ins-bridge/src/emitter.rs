//! Turns one decoded packet into output records.

use tracing::debug;
use vectornav::CompositeData;

use crate::anchor::ReferenceAnchor;
use crate::config::{BridgeConfig, Covariances};
use crate::frames::{xyzw, FrameConvention};
use crate::geodetic::Ellipsoid;
use crate::records::OutputRecord;

fn widen<const N: usize>(v: [f32; N]) -> [f64; N] {
    v.map(f64::from)
}

/// Record assembly for a fixed configuration
#[derive(Debug, Clone)]
pub struct RecordEmitter {
    convention: FrameConvention,
    ellipsoid: Ellipsoid,
    covariances: Covariances,
    publish_imu: bool,
}

impl RecordEmitter {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            convention: config.frames,
            ellipsoid: config.ellipsoid,
            covariances: config.covariances,
            publish_imu: config.publish_imu,
        }
    }

    /// Build every record the packet supports.
    ///
    /// Attitude, angular rate and acceleration are emitted independently of
    /// each other. Position records need both attitude and LLA position and
    /// may latch `anchor`; the reference snapshot accompanies the packet that
    /// latched it.
    pub fn emit(&self, data: &CompositeData, anchor: &mut ReferenceAnchor) -> Vec<OutputRecord> {
        let mut records = Vec::new();

        if let Some(ypr) = data.yaw_pitch_roll() {
            let [yaw, pitch, roll] = widen(ypr).map(f64::to_radians);
            records.push(OutputRecord::AttitudeRpy { roll, pitch, yaw });
        }

        // sensor frame regardless of the output convention
        if let Some(rate) = data.angular_rate() {
            let [x, y, z] = widen(rate);
            records.push(OutputRecord::AngularRate { x, y, z });
        }
        if let Some(accel) = data.acceleration() {
            let [x, y, z] = widen(accel);
            records.push(OutputRecord::Acceleration { x, y, z });
        }

        if let (Some(ypr), Some(lla)) = (data.yaw_pitch_roll(), data.position_lla()) {
            self.position_records(f64::from(ypr[0]).to_radians(), lla, anchor, &mut records);
        }

        if self.publish_imu {
            if let Some(record) = self.imu_record(data) {
                records.push(record);
            }
        }

        records
    }

    fn position_records(
        &self,
        yaw: f64,
        lla: [f64; 3],
        anchor: &mut ReferenceAnchor,
        records: &mut Vec<OutputRecord>,
    ) {
        let (lat, lon) = (lla[0].to_radians(), lla[1].to_radians());
        let ecef = self.ellipsoid.lla_to_ecef(lat, lon);
        let latched = anchor.try_initialize(lat, lon, ecef);

        records.push(OutputRecord::PositionLla {
            latitude: lla[0],
            longitude: lla[1],
            yaw,
        });
        match anchor.get() {
            Some(fix) => {
                let ned = fix.to_ned(&ecef);
                records.push(OutputRecord::PositionNed {
                    north: ned.x,
                    east: ned.y,
                    yaw,
                });
            }
            None => debug!("no reference fix yet, NED pose skipped"),
        }
        records.push(OutputRecord::PositionEcef {
            x: ecef.x,
            y: ecef.y,
            z: ecef.z,
        });

        if latched {
            records.push(OutputRecord::ReferenceSnapshot {
                latitude: lla[0],
                longitude: lla[1],
                yaw,
                ecef: [ecef.x, ecef.y, ecef.z],
            });
        }
    }

    fn imu_record(&self, data: &CompositeData) -> Option<OutputRecord> {
        let q = data.quaternion()?;
        let rate = data.angular_rate()?;
        let accel = data.acceleration()?;

        let mut orientation_covariance = self.covariances.orientation;
        if let Some(sigma) = data.attitude_uncertainty() {
            // sigmas arrive in degrees
            let variances = self
                .convention
                .attitude_variances(widen(sigma).map(|s| s.to_radians().powi(2)));
            for (i, v) in variances.into_iter().enumerate() {
                orientation_covariance[i * 4] = v;
            }
        }

        let angular_velocity = self.convention.vector(widen(rate));
        let linear_acceleration = self.convention.vector(widen(accel));
        Some(OutputRecord::Imu {
            orientation: xyzw(&self.convention.orientation(widen(q))),
            angular_velocity: angular_velocity.into(),
            linear_acceleration: linear_acceleration.into(),
            orientation_covariance,
            angular_velocity_covariance: self.covariances.angular_velocity,
            linear_acceleration_covariance: self.covariances.linear_acceleration,
        })
    }
}
